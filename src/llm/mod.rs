// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Driving hint generation with a hosted completion model

pub mod client;
pub mod prompts;

pub use client::{HintGenerator, LlmConfig, LlmError};
pub use prompts::{format_signs, render_prompt, MAIN_PROMPT_TEMPLATE, NO_SIGNS_DETECTED};
