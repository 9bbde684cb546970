// Fixed replies of the simulated backend.

pub const REFLECTION_RESPONSE: &str = "¡Hola! Basándome en tus reflexiones de esta semana, puedo ver que has tenido una combinación interesante de experiencias. Tu capacidad para reflexionar sobre tanto los momentos positivos como los desafiantes muestra una gran madurez emocional. Te sugiero que continues con esta práctica de autoobservación, ya que es una herramienta poderosa para el crecimiento personal. Considera incorporar pequeños momentos de gratitud en tu rutina diaria para amplificar los aspectos positivos que ya estás notando.";

pub const ACKNOWLEDGMENT_RESPONSE: &str = "Gracias por compartir tus pensamientos. Tu reflexión muestra una perspectiva valiosa y un compromiso genuino con tu bienestar personal.";

const REFLECTION_KEYWORDS: [&str; 2] = ["resumen", "semana"];

/// Picks the reflection reply for weekly-summary prompts, the acknowledgment
/// otherwise. Matching ignores case.
pub fn canned_response(prompt: &str) -> &'static str {
    let prompt = prompt.to_lowercase();
    if REFLECTION_KEYWORDS.iter().any(|kw| prompt.contains(kw)) {
        REFLECTION_RESPONSE
    } else {
        ACKNOWLEDGMENT_RESPONSE
    }
}
