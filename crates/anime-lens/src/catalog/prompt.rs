//! Fixed prompt text sent to the model.

/// Reply the model is told to give when it cannot place the image.
pub const UNIDENTIFIED_SENTINEL: &str = "Unknown";

pub const IDENTIFY_INSTRUCTION: &str = "Identify the anime shown in this image. \
Provide only the name of the anime. If you cannot identify it, respond with 'Unknown'.";

/// Sentinel the model uses when no Canadian streaming service is found.
pub const AVAILABILITY_NOT_FOUND: &str = "Not found";

/// Builds the enrichment request for `title`.
///
/// The key names here are the contract checked by
/// [`parse_details`](super::parse::parse_details).
pub fn enrichment_prompt(title: &str) -> String {
    // Quotes inside the title would end the quoted span early.
    let title = title.replace('"', "'");
    format!(
        r#"
For the anime titled "{title}", provide the following information based on web searches, including community discussions on Reddit. Please format the output as a single JSON object inside a ```json markdown block.

The JSON object must have these exact keys:
- "animeName": The official name of the anime.
- "plotSummary": A concise summary of the anime's plot.
- "animeType": An array of strings representing the genres/categories (e.g., ["Isekai", "Shonen", "Adventure"]).
- "streamingPlatformCanada": A string indicating where the show can be streamed in Canada. If multiple, list them separated by commas. If unknown, state "{not_found}".
- "redditRating": A summary of the community rating or general sentiment from Reddit, presented as a string (e.g., "Highly Recommended", "Mixed Reviews", "Generally Positive").

Do not include any text outside of the JSON markdown block.
"#,
        title = title,
        not_found = AVAILABILITY_NOT_FOUND,
    )
}
