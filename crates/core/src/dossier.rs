//! Plain-text medical record of a patient.

use std::collections::BTreeSet;
use std::fmt;

use crate::entities::Patient;

/// Renders a [`Patient`] as the printable record served at
/// `GET /patients/{id}/dossier`.
pub struct Dossier<'a>(pub &'a Patient);

impl fmt::Display for Dossier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "Dossier Médical de {} {}", p.nom, p.prenom)?;
        writeln!(f, "Numéro d'Urgence: {}", or_dash(p.num_urgence))?;
        writeln!(f, "Téléphone: {}", or_dash(p.telephone))?;
        writeln!(f, "Email: {}", or_dash(p.email.as_deref()))?;
        writeln!(f, "Groupe Sanguin: {}", or_dash(p.groupe_sanguin.as_deref()))?;
        writeln!(f, "Stade: {}", or_dash(p.stade))?;
        writeln!(f, "Symptômes: {}", list(&p.symptomes))?;
        writeln!(f, "Traitements Suivis: {}", list(&p.traitements))?;
        writeln!(f, "Maladies Associées:")?;
        for m in &p.maladies {
            writeln!(f, "- {} ({})", m.nom, or_dash(m.kind.as_deref()))?;
        }
        Ok(())
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn list(values: &BTreeSet<String>) -> String {
    let joined = values.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!("[{joined}]")
}
