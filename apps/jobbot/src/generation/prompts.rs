// All LLM prompt templates for the materials pipeline.
// Templates are data: builders only substitute `{placeholders}`.
// Cross-cutting fragments come from llm_client::prompts.

/// Materials generation prompt.
/// Replace: {no_personal_info}, {profile_json}, {job_json}, {instruction}, {questions}
pub const MATERIALS_PROMPT_TEMPLATE: &str = r#"**Objective:** Generate tailored application materials for a job applicant.

**Applicant Profile:**
{profile_json}

**Job Details:**
{job_json}

**Custom Instructions:**
{instruction}

**Tasks:**
1.  **Cover Letter:** Write a professional, enthusiastic, and tailored cover letter. It should highlight the applicant's most relevant skills and experiences from their profile that match the job description. Incorporate any custom instructions provided. {no_personal_info} Use standard paragraph formatting. Do not use Markdown headings within the cover letter.
2.  **Resume Adjustments:** Provide a list of specific, actionable suggestions for optimizing the applicant's resume for this job. Focus on incorporating keywords from the job description and aligning the experience summary with the role's requirements. Incorporate any custom instructions. Use `**bold**` for keywords or important phrases.
3.  **Answer Questions:** If there are questions below, provide thoughtful and detailed answers based on the applicant's profile. Format each answer as a standard paragraph.

**Application Questions:**
{questions}

**Output Format:**
Return a single JSON object with exactly three keys: "cover_letter", "resume_suggestions", and "question_answers".
- `cover_letter`: A string containing the full body text of the cover letter.
- `resume_suggestions`: A list of strings, where each string is a specific suggestion.
- `question_answers`: A list of objects, each with "question" and "answer" keys.
Do not add any other keys."#;

pub const NO_INSTRUCTIONS: &str = "No custom instructions provided.";
pub const NO_QUESTIONS: &str = "No specific questions found.";

/// ATS keyword extraction prompt.
/// Replace: {max_keywords}, {description}
pub const KEYWORDS_PROMPT_TEMPLATE: &str = r#"From the following job description, extract the {max_keywords} most important keywords and skills.
Return them as a JSON list of strings, e.g. ["Python", "SQL", "Stakeholder management"].

Job Description:
---
{description}
---"#;

/// Materials review prompt.
/// Replace: {ignore_personal_info}, {materials_json}
pub const VALIDATION_PROMPT_TEMPLATE: &str = r#"Please act as a career coach and review the following application materials.
Provide a list of actionable suggestions for improvement.
Focus on clarity, impact, and professionalism. Check for any incomplete sentences or sections.
If "refined_resume" is present, review that full resume text; otherwise, review "resume_suggestions".
{ignore_personal_info}
If the materials need no changes, return an empty list.

Materials:
---
{materials_json}
---

Return a JSON object with a single key "validation_feedback", which is a list of strings.
Example: {"validation_feedback": ["The cover letter could be more specific about project X.", "Consider rephrasing the second resume suggestion for more impact."]}"#;

/// Feedback application prompt.
/// Replace: {materials_json}, {feedback_json}
pub const REFINE_PROMPT_TEMPLATE: &str = r#"Current Materials:
---
{materials_json}
---

Validation Feedback:
---
{feedback_json}
---

Revise the "cover_letter" and "refined_resume" to address all the feedback points. Make sure the revisions improve clarity, impact, professionalism, and incorporate any suggestions. While revising, ensure the content remains optimized for ATS by incorporating key job description keywords without keyword stuffing.

Return a JSON object with keys "cover_letter" and "refined_resume", containing the revised texts."#;

/// Refined resume drafting prompt (free text).
/// Replace: {no_personal_info}, {profile_json}, {description}, {suggestions_json}
pub const RESUME_DRAFT_PROMPT_TEMPLATE: &str = r#"Applicant Profile:
---
{profile_json}
---

Job Description:
---
{description}
---

Resume Suggestions:
---
{suggestions_json}
---

Task: Create a professional resume based on the applicant profile. {no_personal_info} Incorporate all the provided suggestions. Tailor it specifically to the job description, highlighting relevant skills and experiences. Ensure the resume is professional, concise, and optimized for ATS systems by including keywords from the job description.

Use the following formatting guidelines:
- Use `##` for main section headings (e.g., `## Summary`, `## Experience`, `## Education`, `## Skills`).
- For job/education entries, use the format `**Job Title, Company** (*Dates*)` or `**Degree, Institution** (*Dates*)`.
- Use `- ` for bullet points.

Return only the full text of the resume, without any additional explanations."#;

/// Job fit evaluation prompt.
/// Replace: {profile_json}, {description}
pub const FIT_PROMPT_TEMPLATE: &str = r#"User Profile:
{profile_json}

Job Description:
{description}

Based on the user profile and job description, perform the following tasks:
1. Rate the job fit on a scale of 1-10.
2. Provide a brief explanation for the rating.
3. Write a concise one-paragraph summary of the job role and its key responsibilities.

Return a JSON object with the keys: "fit_score", "explanation", and "summary".
Example: {"fit_score": 8, "explanation": "The role aligns well...", "summary": "This is a software engineering role..."}"#;
