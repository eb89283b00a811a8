/*
 * @file lib.rs
 * @brief MasterBot library root
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! MasterBot - a terminal assistant with three modes.
//!
//! This library provides:
//! - Chat with Google's Gemini, keeping a per-session transcript
//! - Question answering over the text of an uploaded PDF
//! - A voice assistant using local Whisper for recognition
//!
//! Responses can be shown, spoken through the platform synthesizer, or both.
//!
//! # Example
//! ```no_run
//! use anyhow::Result;
//! use masterbot::terminal::{self, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     dotenv::dotenv().ok();
//!     terminal::run(RunOptions::default()).await
//! }
//! ```

pub mod ai;
pub mod assistant;
pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod listen;
pub mod pdf;
pub mod session;
pub mod speech;
pub mod terminal;
