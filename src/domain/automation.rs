use serde::{Deserialize, Serialize};
use std::fmt;

/// Automation stacks a generated test suite can target.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomationFramework {
    #[default]
    #[serde(rename = "Playwright (TypeScript)")]
    PlaywrightTypeScript,
    #[serde(rename = "Selenium (Python)")]
    SeleniumPython,
    #[serde(rename = "Cypress (JavaScript)")]
    CypressJavaScript,
}

impl AutomationFramework {
    pub const ALL: [AutomationFramework; 3] = [
        AutomationFramework::PlaywrightTypeScript,
        AutomationFramework::SeleniumPython,
        AutomationFramework::CypressJavaScript,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AutomationFramework::PlaywrightTypeScript => "Playwright (TypeScript)",
            AutomationFramework::SeleniumPython => "Selenium (Python)",
            AutomationFramework::CypressJavaScript => "Cypress (JavaScript)",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        extension_for_framework(self.label())
    }
}

impl fmt::Display for AutomationFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Picks a script extension from a framework display name.
pub fn extension_for_framework(name: &str) -> &'static str {
    if name.contains("Python") {
        "py"
    } else if name.contains("JavaScript") || name.contains("Cypress") {
        "js"
    } else {
        "ts"
    }
}
