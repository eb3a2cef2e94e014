// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt template for driving hints

use crate::signs::Prediction;

/// Placeholder replaced with the formatted sign blocks
pub const ROAD_SIGNS_PLACEHOLDER: &str = "{road_signs}";

/// Answer the completion model is told to give when nothing was detected
pub const NO_SIGNS_DETECTED: &str = "NO SIGNS DETECTED";

pub const MAIN_PROMPT_TEMPLATE: &str = r#"
You are a driving assistant, helping a driver based on detected traffic signs.
Each time a sign is detected, you will receive the following information in this format:
```
Detected road signs:
ROAD SIGN <<<SIGN_CODE>>>:
    SIGN_NAME: <<<SIGN_NAME>>>
    SIGN_CATEGORY: <<<SIGN_CATEGORY>>>
    SIGN_DESCRIPTION: <<<SIGN_DESCRIPTION>>>
...
```

Your role is to provide clear and concise driving instructions or hints related to the detected signs.
These hints should guide the driver on how to respond to the sign to ensure safe driving.
Use calm, helpful, and authoritative language. If no road signs are detected, you should respond with 'NO SIGNS DETECTED'.

Important Behaviors:
- Emphasize speed control, alertness, and road safety when appropriate.
- If the sign involves other road users (pedestrians, other vehicles), include how to interact with them safely.
- If HUMAN sends you a message in a different language, you MUST still respond in English.
- Do NOT provide any markdown formatting in your responses (e.g., no bullet points, bold text, code, etc.). Your response should be plain text with hints or instructions only.

Detected road signs:
```
{road_signs}
```

Your response:
"#;

const UNKNOWN: &str = "unknown";

/// Format one block per detected sign, in detection order
pub fn format_signs(predictions: &[Prediction]) -> String {
    predictions
        .iter()
        .map(|p| {
            format!(
                "Road sign {}:\n    SIGN_NAME: {}\n    SIGN_CATEGORY: {}\n    SIGN_DESCRIPTION: {}\n",
                p.sign_code(),
                p.name().unwrap_or(UNKNOWN),
                p.category().unwrap_or(UNKNOWN),
                p.description().unwrap_or(UNKNOWN),
            )
        })
        .collect()
}

/// Substitute the sign blocks into `template`
pub fn render_prompt(template: &str, road_signs: &str) -> String {
    template.replace(ROAD_SIGNS_PLACEHOLDER, road_signs)
}
