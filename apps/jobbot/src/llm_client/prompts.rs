// Shared prompt fragments. Each stage keeps its own templates in generation::prompts;
// this file holds the cross-cutting pieces they all reuse.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// System prompt for free-text writing calls.
pub const WRITER_SYSTEM: &str = "You are an expert resume writer and career coach. \
    Write concise, professional, ATS-friendly text. \
    Return only the requested text, without commentary.";

/// Personal details are composed into headers by the export stage, never by the model.
pub const NO_PERSONAL_INFO_INSTRUCTION: &str = "Generate the body content only. \
    Do not include any headers, personal names, contact details (phone, email, LinkedIn), \
    or location information, as these will be added separately.";

/// Stops the reviewer from flagging the intentionally missing personal details.
pub const IGNORE_PERSONAL_INFO_INSTRUCTION: &str = "Do not comment on the absence of \
    personal information (name, contact details, location) as these are intentionally \
    excluded from the generated content.";
