//! Built-in climate-health evidence corpus.

use crate::models::{NewDocument, SOURCE_KEY};

const CATEGORY_KEY: &str = "category";

/// `(source, category, content)` for each seed document.
const SEED_DOCUMENTS: [(&str, &str, &str); 20] = [
    (
        "WHO Heat Health Guidelines",
        "heat",
        "Extreme heat exposure increases risk of heat stroke, dehydration, and cardiovascular stress. Vulnerable populations include elderly, children, and those with pre-existing conditions.",
    ),
    (
        "EPA Air Quality Standards",
        "air_quality",
        "Air Quality Index (AQI) above 150 indicates unhealthy conditions. PM2.5 particles can penetrate deep into lungs causing respiratory issues and aggravating asthma.",
    ),
    (
        "Skin Cancer Foundation",
        "uv",
        "UV Index above 8 is very high. Prolonged exposure without protection can cause skin damage and increase cancer risk. Use SPF 50+ sunscreen and protective clothing.",
    ),
    (
        "Lancet Climate Health Report",
        "disease",
        "Climate change increases disease vector habitats. Warmer temperatures and increased rainfall expand mosquito breeding grounds, raising dengue and malaria risk.",
    ),
    (
        "Geriatric Health Association",
        "elderly",
        "Elderly individuals (65+) are at higher risk during heat waves due to reduced thermoregulation. Monitor hydration and avoid outdoor activities during peak heat hours.",
    ),
    (
        "Pediatric Health Guidelines",
        "children",
        "Children under 12 have higher metabolic rates and are more susceptible to heat stress. Ensure adequate hydration and monitor for signs of heat exhaustion.",
    ),
    (
        "Asthma and Allergy Foundation",
        "respiratory",
        "Individuals with asthma should avoid outdoor activities when AQI exceeds 100. Use prescribed inhalers and keep emergency medications accessible.",
    ),
    (
        "American Heart Association",
        "cardiovascular",
        "Cardiovascular patients are at increased risk during extreme heat. Heat stress can trigger heart attacks. Stay in cool environments and follow medication schedules.",
    ),
    (
        "Nutrition and Hydration Board",
        "hydration",
        "Hydration guidelines: Drink 8-10 glasses of water daily, increase to 12-15 during hot weather. Avoid caffeinated and alcoholic beverages which cause dehydration.",
    ),
    (
        "Indoor Air Quality Council",
        "indoor_health",
        "Indoor air quality management: Use HEPA filters, keep windows closed during high pollution periods, and maintain 40-60% humidity levels.",
    ),
    (
        "Sports Medicine Institute",
        "exercise",
        "Exercise during climate stress: Choose early morning (6-8 AM) or evening (after 6 PM) for outdoor activities. Monitor heart rate and stop if feeling dizzy.",
    ),
    (
        "Diabetes Care Foundation",
        "diabetes",
        "Diabetes management in hot weather: Heat affects blood sugar levels. Check glucose more frequently and store insulin properly in cool conditions.",
    ),
    (
        "Maternal Health Organization",
        "pregnancy",
        "Pregnant women are vulnerable to heat stress and air pollution. Avoid prolonged outdoor exposure and maintain regular prenatal checkups.",
    ),
    (
        "Mental Health Climate Initiative",
        "mental_health",
        "Mental health impacts: Climate anxiety and heat stress can worsen depression and anxiety. Practice stress management and seek support when needed.",
    ),
    (
        "Emergency Medicine Guidelines",
        "emergency",
        "Emergency signs requiring immediate medical attention: confusion, rapid heartbeat, nausea, severe headache, difficulty breathing. Call emergency services immediately.",
    ),
    (
        "Environmental Health Institute",
        "sustainability",
        "Sustainable lifestyle reduces climate impact: Use public transport, reduce meat consumption, conserve water, and minimize plastic use.",
    ),
    (
        "Immunology Research Center",
        "immunity",
        "Air pollution and immunity: Long-term exposure to poor air quality weakens immune system. Boost immunity with vitamin C, D, and antioxidant-rich foods.",
    ),
    (
        "Sleep Medicine Society",
        "sleep",
        "Sleep quality in hot weather: Maintain room temperature at 18-22°C, use breathable fabrics, and avoid heavy meals before bedtime.",
    ),
    (
        "Food Safety Authority",
        "food_safety",
        "Food safety during heat: Refrigerate perishables immediately. Bacteria multiply rapidly in warm conditions. Avoid street food during heat waves.",
    ),
    (
        "Water Health Organization",
        "waterborne",
        "Water-borne disease prevention: Boil water during floods and monsoons. Climate change increases contamination risk. Use water purification methods.",
    ),
];

/// Returns the built-in seed documents with `source` and `category` metadata.
#[must_use]
pub fn seed_corpus() -> Vec<NewDocument> {
    SEED_DOCUMENTS
        .iter()
        .map(|(source, category, content)| {
            NewDocument::new(*content)
                .with_metadata(SOURCE_KEY, *source)
                .with_metadata(CATEGORY_KEY, *category)
        })
        .collect()
}
