//! Fixed prompts and request parameters.

/// Prompt sent with the face photo and logo to the multimodal model.
pub const SKYDIVER_PROMPT: &str = concat!(
    "Generate an ultra-realistic cinematic image of a skydiver diving ",
    "from a jet painted in IndiGo Airlines livery. Use the provided face photo ",
    "for the diver's identity, and apply the IndiGo logo onto the airplane. ",
    "Show the diver mid-air, arms spread wide, with blue sky and clouds in the background."
);

/// Prompt sent to the task-based image API alongside the photo reference.
pub const TASK_PROMPT: &str = concat!(
    "Ultra-realistic cinematic photo of the person in the reference image skydiving ",
    "from a jet painted in IndiGo Airlines livery, arms spread wide, ",
    "blue sky and clouds in the background."
);

/// Gemini model used for the synchronous variant.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash-image";

/// Mime type declared for every image part, whatever was uploaded.
pub const DECLARED_MIME_TYPE: &str = "image/png";

pub const TASK_ASPECT_RATIO: &str = "16:9";
pub const TASK_PROCESS_MODE: &str = "turbo";
pub const TASK_SKIP_PROMPT_CHECK: bool = false;

/// Multipart field carrying the user's photo.
pub const UPLOAD_FIELD: &str = "face";

/// Model and task type understood by the task-based image API.
pub const TASK_MODEL: &str = "midjourney";
pub const TASK_TYPE: &str = "imagine";
