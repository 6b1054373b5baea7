//! System prompt handed to every parse producer.

use crate::config::PromptConfig;
use crate::error::{ParseEvalError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Built-in prompt describing the parse schema for German hotel searches.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"Du bist ein Parser für deutsche Hotelsuchanfragen. Antworte NUR mit EINEM JSON-Objekt, das GENAU dieses Schema hat (keine zusätzlichen Felder):

{
  "location": "string",
  "dates": { "checkin": "YYYY-MM-DD", "checkout": "YYYY-MM-DD" },
  "guests": { "adults": 0, "children": 0 },
  "price_max_eur": 0,
  "stars_min": 0,
  "rating_min": 0,
  "family_friendly": false,
  "ui_filters": {
    "meals": [], "ratings": [], "hotelTypes": [], "hotelfacilities": [],
    "poolbeach": [], "distanceBeach": [], "travelGroup": [], "stars": [],
    "wellness": [], "reference_distance_max": [], "flex": [], "children": [],
    "parking": [], "freetime": [], "certifications": [], "hotelthemes": [],
    "hotelBrand": [], "hotelinformation": []
  },
  "unsupported_criteria": []
}

Regeln:
- Preis als EUR-Zahl in price_max_eur (z. B. „unter 150€“ → 150). Keine Buckets.
- Synonyme mappen: WLAN→hotelfacilities.free_hotel_wifi; Frühstück→meals.breakfast; All-inclusive/AI→meals.only_all_inclusive (+hotelthemes.allInclusiveHotel wenn Thema); Wellness/Spa→wellness.spa; Innenpool→poolbeach.heated_pool; Außenpool→poolbeach.pool; „am Strand“→distanceBeach:["500"]; Adults-only→travelGroup.adultsOnly (+hotelthemes.adultsOnly).
- Sterne/Bewertung: „mind. 4 Sterne“ → stars_min:4 UND ui_filters.stars:["4"]; „8+“ → rating_min:8 UND ui_filters.ratings:["8"].
- Nur explizit genannte Daten und Gäste setzen, sonst leer lassen.
- Mehrdeutiges (z. B. „günstig“, „nahe“, „ruhig“) nicht raten, sondern wörtlich in unsupported_criteria übernehmen.
- Keine Erklärungen, nur das JSON-Objekt."#;

/// Heading placed before the few-shot examples.
const EXAMPLES_HEADING: &str = "Beispiele (nur zur Steuerung, nicht ausgeben):";

/// Assemble the system prompt: an override file replaces the built-in
/// prompt, and an examples file is appended when present.
pub fn load_system_prompt(config: &PromptConfig) -> Result<String> {
    let mut prompt = match read_optional(&config.system_prompt_path)? {
        Some(custom) => custom,
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    if let Some(examples) = read_optional(&config.examples_path)? {
        prompt.push_str("\n\n");
        prompt.push_str(EXAMPLES_HEADING);
        prompt.push('\n');
        prompt.push_str(&examples);
    }

    Ok(prompt)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        debug!(path = %path.display(), "prompt file not found, using default");
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ParseEvalError::io(path, e))
}
