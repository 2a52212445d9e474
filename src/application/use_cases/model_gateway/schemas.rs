//! Response schemas sent with structured-output requests.

use serde_json::{json, Value};

fn step_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "stepNumber": { "type": "INTEGER" },
            "action": { "type": "STRING" },
            "expectedResult": { "type": "STRING" }
        },
        "required": ["stepNumber", "action", "expectedResult"]
    })
}

pub(crate) fn requirements_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "requirements": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "enum": [
                                "User Requirement",
                                "Functional Requirement",
                                "Technical Requirement"
                            ]
                        },
                        "description": { "type": "STRING" },
                        "priority": {
                            "type": "STRING",
                            "enum": ["High", "Medium", "Low"]
                        }
                    },
                    "required": ["type", "description", "priority"]
                }
            },
            "suggestedProjectName": { "type": "STRING" }
        },
        "required": ["requirements", "suggestedProjectName"]
    })
}

pub(crate) fn test_cases_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "requirementId": { "type": "STRING" },
                "title": { "type": "STRING" },
                "steps": { "type": "ARRAY", "items": step_schema() }
            },
            "required": ["requirementId", "title", "steps"]
        }
    })
}

pub(crate) fn fix_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "steps": { "type": "ARRAY", "items": step_schema() },
            "explanation": { "type": "STRING" }
        },
        "required": ["steps", "explanation"]
    })
}

pub(crate) fn refine_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "steps": { "type": "ARRAY", "items": step_schema() }
        },
        "required": ["title", "steps"]
    })
}
