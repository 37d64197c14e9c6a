// Prompt text for every AI feature. Builders return the user prompt; the
// system prompts are constants.

use resume_domain::ai::WritingSection;

pub const RESUME_WRITER_SYSTEM: &str = "You are a professional resume writer.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

const BULLET_RULES: &str = "\
Requirements:
- Start each bullet point with a strong action verb
- Include quantifiable achievements where possible
- Be specific and impactful
- Format as a simple list, one bullet per line
- Do not include bullet symbols or numbering";

pub fn generate_subpoints(
    section: WritingSection,
    name: Option<&str>,
    tech_stack: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Generate 3-4 professional bullet points for a resume {} section.\n",
        section.as_str()
    );
    if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!("Name: {name}\n"));
    }
    if let Some(stack) = tech_stack.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("Tech Stack: {stack}\n"));
    }
    prompt.push('\n');
    prompt.push_str(BULLET_RULES);
    prompt
}

pub fn rephrase_title(section: WritingSection, current_title: &str) -> String {
    format!(
        "Rephrase this resume {} title to be more impactful and professional:\n\n\
         Current title: {current_title}\n\n\
         Requirements:\n\
         - Keep it concise (max 10 words)\n\
         - Use strong, action-oriented language\n\
         - Return only the rephrased title, nothing else",
        section.as_str()
    )
}

pub fn rephrase_subpoints(section: WritingSection, subpoints: &[String]) -> String {
    let list = subpoints
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Rephrase these resume {} bullet points to be more professional and impactful:\n\n\
         {list}\n\n{BULLET_RULES}\n- Maintain the same number of bullet points",
        section.as_str()
    )
}

/// Asks for JSON in the exact shape of `ExtractedResumeData`.
pub fn extract_resume(resume_text: &str) -> String {
    format!(
        r#"Extract the structured content of the resume below.

Return a JSON object with these keys (omit nothing, use [] or null when absent):
{{
  "heading": {{"mobile": string|null, "custom_links": [{{"label": string, "url": string}}]}} | null,
  "experiences": [{{"company", "location", "position", "start_date", "end_date", "projects": [{{"title", "description"}}]}}],
  "projects": [{{"name", "start_date", "end_date", "tech_stack", "link": string|null, "link_label": string|null, "subpoints": [string]}}],
  "education": [{{"institution", "location", "degree", "gpa": number|null, "max_gpa": number|null, "start_date", "end_date", "courses": [string]}}],
  "skills": [{{"category", "items": [string]}}],
  "certifications": [{{"title", "start_date", "end_date", "instructor": string|null, "platform", "certification_link": string|null}}],
  "awards": [{{"title", "date"}}],
  "volunteer_experiences": [{{"position", "organization", "location", "description", "start_date", "end_date"}}]
}}

Rules:
- Dates look like "Jan 2024"; use "Present" for ongoing roles.
- Links must be absolute http(s) URLs.
- Copy wording from the resume; do not invent details.

Resume text:
---
{resume_text}
---"#
    )
}

/// Asks the model to pick element ids for a job description from a catalog
/// of `kind id: summary` lines.
pub fn select_elements(job_description: &str, catalog: &str) -> String {
    format!(
        r#"Choose the resume elements that best fit the job description.

Job description:
---
{job_description}
---

Available elements (kind, id, summary):
{catalog}

Return JSON:
{{
  "heading_ids": [id], "education_ids": [id], "experience_ids": [id], "project_ids": [id],
  "skill_ids": [id], "certification_ids": [id], "award_ids": [id], "volunteer_ids": [id],
  "reasoning": string
}}

Rules:
- Use only ids from the list above.
- Pick at most one heading.
- Order ids within each list from most to least relevant."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_subpoints_skips_blank_context() {
        let prompt = generate_subpoints(WritingSection::Project, Some("Forge"), Some("  "));
        assert!(prompt.contains("resume project section"));
        assert!(prompt.contains("Name: Forge"));
        assert!(!prompt.contains("Tech Stack"));
    }

    #[test]
    fn test_rephrase_subpoints_lists_inputs() {
        let prompt = rephrase_subpoints(
            WritingSection::Experience,
            &["did a thing".to_string(), "did another".to_string()],
        );
        assert!(prompt.contains("- did a thing\n- did another"));
        assert!(prompt.contains("same number"));
    }
}
