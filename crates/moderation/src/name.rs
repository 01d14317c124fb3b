//! Anzeigenamen

use crate::error::{ModerationError, ModerationResult};

/// Minimale Laenge eines Anzeigenamens (Zeichen)
pub const NAME_MIN_ZEICHEN: usize = 2;
/// Maximale Laenge eines Anzeigenamens (Zeichen)
pub const NAME_MAX_ZEICHEN: usize = 30;

/// Prueft einen Anzeigenamen und gibt ihn getrimmt zurueck
pub fn name_validieren(name: &str) -> ModerationResult<&str> {
    let name = name.trim();
    let laenge = name.chars().count();
    if !(NAME_MIN_ZEICHEN..=NAME_MAX_ZEICHEN).contains(&laenge) {
        return Err(ModerationError::UngueltigeEingabe(format!(
            "Name muss {NAME_MIN_ZEICHEN} bis {NAME_MAX_ZEICHEN} Zeichen lang sein (ist {laenge})"
        )));
    }
    Ok(name)
}
