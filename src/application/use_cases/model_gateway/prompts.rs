use crate::domain::automation::AutomationFramework;
use crate::domain::requirement::Requirement;
use crate::domain::test_case::{TestCase, TestStep};

pub(crate) const CHAT_SYSTEM_PROMPT: &str = "You are a senior QA analyst helping a product team capture requirements for a new validation project. Ask one focused question at a time about users, functional behaviour, and technical constraints. Keep answers short and conversational. When the user seems done, summarise what you have captured and tell them they can finish to generate the test plan.";

pub(crate) const EXTRACTION_SYSTEM_PROMPT: &str = "You are a requirements engineer. Read the conversation transcript and extract a clean list of testable requirements. Classify each as User Requirement, Functional Requirement or Technical Requirement and give it a High, Medium or Low priority. Also suggest a short project name. Return only JSON matching the schema.";

pub(crate) const GENERATION_SYSTEM_PROMPT: &str = "You are a QA automation engineer. Write manual test cases for the given requirements. Produce at least one test case per requirement and reference it by its id in requirementId. Each test case has a concise title and ordered steps, each with an action and an expected result. Return only JSON matching the schema.";

pub(crate) const FIX_SYSTEM_PROMPT: &str = "You are a QA automation engineer debugging a failed test case. Work out why it most likely failed and rewrite the steps so the test is correct and robust. Explain the change in one or two sentences. Return only JSON matching the schema.";

pub(crate) const REFINE_SYSTEM_PROMPT: &str = "You are a QA automation engineer. Rewrite the given test case according to the user's instruction. Keep it focused on the same requirement. Return only JSON matching the schema.";

pub(crate) const CODE_SYSTEM_PROMPT: &str = "You are a senior test automation engineer. Turn manual test cases into a single runnable automated test suite. Use idiomatic patterns for the requested framework, one test per test case, with clear selectors and assertions. Return only the source code.";

pub(crate) fn build_extraction_prompt(transcript: &str) -> String {
    format!(
        "Conversation transcript:\n{}\n\nExtract the requirements discussed above.",
        transcript
    )
}

pub(crate) fn build_generation_prompt(requirements: &[Requirement]) -> String {
    let mut body = String::from("Requirements:\n");
    for requirement in requirements {
        body.push_str(&format!(
            "- {} [{} | {} priority]: {}\n",
            requirement.id, requirement.category, requirement.priority, requirement.description
        ));
    }
    body.push_str("\nGenerate the test cases.");
    body
}

fn push_steps(body: &mut String, steps: &[TestStep]) {
    for step in steps {
        body.push_str(&format!(
            "{}. {} => {}\n",
            step.step_number, step.action, step.expected_result
        ));
    }
}

pub(crate) fn build_fix_prompt(test_case: &TestCase) -> String {
    let mut body = format!(
        "Test case {} for {}: {}\nSteps:\n",
        test_case.id, test_case.requirement_id, test_case.title
    );
    push_steps(&mut body, &test_case.steps);

    if let Some(step) = test_case.failed_step_number {
        body.push_str(&format!("\nFailed at step {}.\n", step));
    }
    if let Some(reason) = &test_case.failure_reason {
        body.push_str(&format!("Failure reason: {}\n", reason));
    }
    if !test_case.logs.is_empty() {
        body.push_str("\nExecution log:\n");
        for line in &test_case.logs {
            body.push_str(line);
            body.push('\n');
        }
    }
    body
}

pub(crate) fn build_refine_prompt(test_case: &TestCase, instruction: &str) -> String {
    let mut body = format!("Current title: {}\nCurrent steps:\n", test_case.title);
    push_steps(&mut body, &test_case.steps);
    body.push_str(&format!("\nInstruction: {}\n", instruction.trim()));
    body
}

pub(crate) fn build_code_prompt(
    test_cases: &[TestCase],
    framework: AutomationFramework,
    env_config: Option<&str>,
) -> String {
    let mut body = format!("Framework: {}\n", framework.label());
    if let Some(env) = env_config.filter(|env| !env.trim().is_empty()) {
        body.push_str("Environment configuration:\n");
        body.push_str(env);
        body.push('\n');
    }
    body.push_str("\nTest cases:\n");
    for case in test_cases {
        body.push_str(&format!("\n{} ({}): {}\n", case.id, case.requirement_id, case.title));
        push_steps(&mut body, &case.steps);
    }
    body
}
