/*
 * @file error.rs
 * @brief Error taxonomy for MasterBot's generation path
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

//! Errors raised by the text generation client.
//!
//! Recognition failures travel in-band as sentinel strings (see
//! [`crate::listen`]) and extraction gaps are silently tolerated (see
//! [`crate::pdf`]), so only generation has a structured error type.

use thiserror::Error;

/// Failure of a single generation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No credential was available when the client was built.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote service failed (network, timeout, quota, malformed body).
    #[error("Service error: {0}")]
    Service(String),
}

impl GenerationError {
    /// Returns `true` when the failure comes from missing configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerationError::Configuration(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Service(format!("request timed out: {}", err))
        } else {
            GenerationError::Service(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        let err = GenerationError::Configuration("missing key".into());
        assert_eq!(err.to_string(), "Configuration error: missing key");
        let err = GenerationError::Service("quota".into());
        assert_eq!(err.to_string(), "Service error: quota");
    }

    #[test]
    fn configuration_flag() {
        assert!(GenerationError::Configuration(String::new()).is_configuration());
        assert!(!GenerationError::Service(String::new()).is_configuration());
    }
}
