//! Personalized weekly analysis.
//!
//! The host app builds a plain-text weekly summary of the user's journal and
//! sends it as the prompt. [`WeekSummary::parse`] pulls the figures back out of
//! that text and [`render`] turns them into a structured reply. Fields that
//! are missing or malformed keep their zero value.

use std::sync::OnceLock;

use regex::Regex;

const NAME_START: &str = "de ";
const NAME_END: &str = " de esta semana";
const REFLECTIONS_TOTAL: &str = "Total de días con reflexiones: ";
const MOOD_AVG: &str = "Estado de ánimo promedio: ";
const ENERGY_AVG: &str = "Nivel de energía promedio: ";
const STRESS_AVG: &str = "Nivel de estrés promedio: ";
const KEY_REFLECTIONS: &str = "REFLEXIONES DESTACADAS:";
const KEY_REFLECTIONS_END: &str = "\n\nMOMENTOS";
const MOMENTS_TOTAL: &str = "Total de momentos registrados: ";
const SCORE_SUFFIX: &str = "/10";

fn numbered_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s*(.*)$").expect("numbered line pattern is valid"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekSummary {
    pub user_name: Option<String>,
    pub total_reflections: u32,
    pub avg_mood: f64,
    pub avg_energy: f64,
    pub avg_stress: f64,
    pub total_moments: u32,
    pub key_reflections: Vec<String>,
}

impl WeekSummary {
    pub fn parse(prompt: &str) -> Self {
        Self {
            user_name: user_name(prompt),
            total_reflections: line_value(prompt, REFLECTIONS_TOTAL).unwrap_or_default(),
            avg_mood: score(prompt, MOOD_AVG).unwrap_or_default(),
            avg_energy: score(prompt, ENERGY_AVG).unwrap_or_default(),
            avg_stress: score(prompt, STRESS_AVG).unwrap_or_default(),
            total_moments: line_value(prompt, MOMENTS_TOTAL).unwrap_or_default(),
            key_reflections: key_reflections(prompt),
        }
    }

    pub fn has_data(&self) -> bool {
        self.total_reflections > 0 || self.total_moments > 0 || !self.key_reflections.is_empty()
    }
}

fn user_name(prompt: &str) -> Option<String> {
    let start = prompt.find(NAME_START)? + NAME_START.len();
    let end = prompt.find(NAME_END)?;
    if start >= end {
        return None;
    }
    let name = prompt[start..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Value between `marker` and the end of its line.
fn line_value<T: std::str::FromStr>(prompt: &str, marker: &str) -> Option<T> {
    let rest = after(prompt, marker)?;
    let line = rest.split('\n').next().unwrap_or(rest);
    line.trim().parse().ok()
}

/// Value between `marker` and the following `/10`.
fn score(prompt: &str, marker: &str) -> Option<f64> {
    let rest = after(prompt, marker)?;
    let end = rest.find(SCORE_SUFFIX)?;
    rest[..end].trim().parse().ok()
}

fn after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    prompt.find(marker).map(|at| &prompt[at + marker.len()..])
}

fn key_reflections(prompt: &str) -> Vec<String> {
    let Some(section) = after(prompt, KEY_REFLECTIONS) else {
        return Vec::new();
    };
    let section = section
        .find(KEY_REFLECTIONS_END)
        .map_or(section, |end| &section[..end]);

    section
        .lines()
        .filter_map(|line| numbered_line().captures(line.trim()))
        .map(|caps| caps[1].replace('"', ""))
        .collect()
}

/// Builds the reply for `summary`: the full analysis when the week has
/// entries, a gentle nudge otherwise.
pub fn render(summary: &WeekSummary) -> String {
    if summary.has_data() {
        personalized_analysis(summary)
    } else {
        empty_week(summary.user_name.as_deref())
    }
}

fn personalized_analysis(data: &WeekSummary) -> String {
    let mut out = String::new();
    let name = data.user_name.as_deref().unwrap_or("");

    out.push_str(&format!("**¡Hola {name}!**\n\n"));

    out.push_str("**RESUMEN SEMANAL:**\n");
    out.push_str(&format!(
        "Esta semana registraste {} reflexiones, mostrando ",
        data.total_reflections
    ));
    if data.avg_mood >= 7.0 {
        out.push_str(&format!("un excelente estado de ánimo promedio de {:.1}/10. ", data.avg_mood));
    } else if data.avg_mood >= 5.0 {
        out.push_str(&format!("un estado de ánimo equilibrado de {:.1}/10. ", data.avg_mood));
    } else {
        out.push_str(&format!(
            "un estado de ánimo de {:.1}/10, sugiriendo algunos desafíos importantes. ",
            data.avg_mood
        ));
    }
    if data.avg_energy > 0.0 {
        out.push_str(&format!("Tu nivel de energía ({:.1}/10) ", data.avg_energy));
        out.push_str(if data.avg_energy >= 7.0 {
            "muestra vitalidad constante."
        } else if data.avg_energy >= 5.0 {
            "indica un equilibrio energético razonable."
        } else {
            "sugiere la necesidad de recargar energías."
        });
    }
    out.push_str("\n\n");

    out.push_str("**INSIGHTS PROFUNDOS:**\n");
    if data.total_reflections >= 5 {
        out.push_str(&format!(
            "• Tu consistencia en la reflexión ({} días) demuestra un compromiso excepcional\n",
            data.total_reflections
        ));
    } else if data.total_reflections >= 3 {
        out.push_str("• Tu práctica regular de reflexión muestra disciplina personal valiosa\n");
    } else {
        out.push_str("• Hay oportunidad para mayor consistencia en tu práctica reflexiva\n");
    }
    if data.avg_mood >= 7.0 && data.avg_stress <= 4.0 {
        out.push_str("• Logras mantener un equilibrio emocional admirable con bajo estrés\n");
    } else if data.avg_mood >= 6.0 {
        out.push_str("• Tu capacidad de mantener una perspectiva positiva es una fortaleza clave\n");
    } else {
        out.push_str("• Tu honestidad sobre los desafíos emocionales muestra gran autoconocimiento\n");
    }
    if data.avg_energy >= 7.0 {
        out.push_str("• Tu alta energía sugiere hábitos de vida que te favorecen\n");
    } else if data.avg_energy > 0.0 && data.avg_energy <= 4.0 {
        out.push_str("• Los niveles bajos de energía podrían indicar necesidad de cambios en rutinas\n");
    }
    if !data.key_reflections.is_empty() {
        out.push_str("• Tus reflexiones muestran profundidad y sinceridad en el autoexamen\n");
    }
    out.push('\n');

    out.push_str("**RECOMENDACIONES PERSONALIZADAS:**\n");
    if data.total_reflections < 4 {
        out.push_str("• Intenta reflexionar más frecuentemente - incluso 2 minutos diarios marcan diferencia\n");
    }
    if data.avg_mood < 5.0 {
        out.push_str("• Considera incorporar una pequeña actividad que disfrutes cada día\n");
        out.push_str("• Explora técnicas de manejo emocional como respiración o caminatas\n");
    } else if data.avg_mood >= 7.0 {
        out.push_str("• Mantén las prácticas que están funcionando tan bien para ti\n");
        out.push_str("• Considera compartir tu enfoque positivo con otros\n");
    }
    if data.avg_energy > 0.0 && data.avg_energy <= 4.0 {
        out.push_str("• Revisa tus patrones de sueño y nutrición para optimizar energía\n");
        out.push_str("• Pequeños descansos durante el día pueden ser muy efectivos\n");
    }
    if data.avg_stress > 6.0 {
        out.push_str("• Identifica las principales fuentes de estrés y abórdalas gradualmente\n");
        out.push_str("• Técnicas de relajación específicas podrían ser muy beneficiosas\n");
    }
    out.push('\n');

    out.push_str("**REFLEXIÓN FINAL:**\n");
    out.push_str(if data.avg_mood >= 6.0 && data.total_reflections >= 4 {
        "Tu dedicación constante y tu actitud positiva crean una base sólida para el crecimiento continuo. ¡Excelente trabajo!"
    } else if data.avg_mood < 5.0 {
        "Atravesar momentos difíciles con la voluntad de reflexionar demuestra una fortaleza admirable. Cada día es una nueva oportunidad."
    } else {
        "Tu compromiso con el autoconocimiento te está llevando por un camino valioso de desarrollo personal. ¡Continúa adelante!"
    });

    out
}

fn empty_week(user_name: Option<&str>) -> String {
    format!(
        "**¡Hola {}!**\n\n\
         **OBSERVACIÓN CLAVE:**\n\
         Esta semana no registraste reflexiones en tu diario, y eso también nos dice algo valioso.\n\n\
         **INSIGHT PROFUNDO:**\n\
         Los períodos sin registro suelen coincidir con semanas muy ocupadas o momentos de transición. \
         Esto es completamente normal y parte del ritmo natural de la vida.\n\n\
         **RECOMENDACIÓN PERSONALIZADA:**\n\
         Prueba la \"reflexión de 30 segundos\": antes de dormir, pregúntate simplemente \
         \"¿Cómo me sentí hoy?\" No necesitas escribir un párrafo; incluso una palabra o emoji cuenta.\n\n\
         Recuerda: la constancia importa más que la perfección. ¡Nos vemos la próxima semana! 🌟",
        user_name.unwrap_or("")
    )
}
