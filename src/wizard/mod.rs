// ============================================================================
// WIZARDS DE CRÉATION DE PRODUIT
// ============================================================================
//
// Description:
//   Machine à états linéaire commune aux trois assistants (lead magnet,
//   produit digital, webinar). Chaque assistant fournit:
//     - son énumération d'étapes (ordre = ordre d'affichage)
//     - un prédicat par étape (gate "Next")
//     - la construction du DraftInput envoyé à /api/drafts
//
// Règles:
//   - current ∈ [1, N], Next/Previous avancent d'exactement une étape
//   - Next est refusé (pas d'erreur) si le gate de l'étape courante échoue
//   - Save Draft est possible depuis n'importe quelle étape
//   - Finalize: dernière étape ET tous les gates valides (le premier qui
//     échoue est renvoyé)
//
// Le serveur rejoue can_finalize sur la ligne fusionnée avant publication
// (DraftService::finalize_draft).
//
// ============================================================================

use std::fmt::{Debug, Display};

use thiserror::Error;

use crate::models::dto::DraftInput;
use crate::models::payload::{CollectedField, FieldType};
use crate::models::products::{self, ProductType};
use crate::utils::patch::Patch;

pub mod digital_product;
pub mod lead_magnet;
pub mod webinar;

pub use digital_product::{DigitalProductForm, DigitalStep};
pub use lead_magnet::{LeadMagnetForm, LeadMagnetStep};
pub use webinar::{WebinarForm, WebinarStep};

//trait = Interface d'un assistant
pub trait WizardFlow: Sized {
    type Step: Copy + PartialEq + Debug + Display + 'static;

    const PRODUCT_TYPE: ProductType;

    /// Étapes dans l'ordre, la dernière porte l'action "Create"
    fn steps() -> &'static [Self::Step];

    /// Gate de sortie d'une étape
    fn step_complete(&self, step: Self::Step) -> bool;

    /// Champs persistés (sans current_step, ajouté par Wizard)
    fn draft_input(&self) -> DraftInput;

    /// Reprise d'un brouillon existant
    fn from_product(product: &products::Model) -> Self;
}

#[derive(Debug, Clone)]
pub struct Wizard<F: WizardFlow> {
    pub form: F,
    current: usize,
}

impl<F: WizardFlow> Wizard<F> {
    pub fn new(form: F) -> Self {
        Wizard { form, current: 1 }
    }

    /// Reprend à l'étape enregistrée, bornée à [1, N]
    pub fn resume(product: &products::Model) -> Self {
        let total = F::steps().len() as i32;
        Wizard {
            form: F::from_product(product),
            current: product.current_step.clamp(1, total) as usize,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total_steps(&self) -> usize {
        F::steps().len()
    }

    pub fn step(&self) -> F::Step {
        F::steps()[self.current - 1]
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.total_steps()
    }

    pub fn can_go_next(&self) -> bool {
        !self.is_last_step() && self.form.step_complete(self.step())
    }

    /// Renvoie true si l'étape a changé
    pub fn next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 1 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Premier gate en échec sur l'ensemble des étapes
    pub fn first_incomplete_step(&self) -> Option<F::Step> {
        F::steps()
            .iter()
            .copied()
            .find(|step| !self.form.step_complete(*step))
    }

    pub fn can_finalize(&self) -> Result<(), F::Step> {
        match self.first_incomplete_step() {
            Some(step) => Err(step),
            None if self.is_last_step() => Ok(()),
            None => Err(self.step()),
        }
    }

    pub fn save_draft_input(&self) -> DraftInput {
        DraftInput {
            product_type: Some(F::PRODUCT_TYPE),
            current_step: Some(self.current as i32),
            ..self.form.draft_input()
        }
    }

    pub fn finalize_input(&self) -> Result<DraftInput, F::Step> {
        self.can_finalize()?;
        Ok(self.save_draft_input())
    }
}

/// Vérifie qu'un brouillon fusionné peut être publié.
/// Les types sans assistant n'ont que le titre à contrôler.
pub fn check_publishable(product: &products::Model) -> Result<(), String> {
    fn check<F: WizardFlow>(product: &products::Model) -> Result<(), String> {
        match Wizard::<F>::resume(product).first_incomplete_step() {
            Some(step) => Err(format!("Cannot publish: the {} step is incomplete", step)),
            None => Ok(()),
        }
    }

    match product.product_type {
        ProductType::FreeLead => check::<LeadMagnetForm>(product),
        ProductType::Digital => check::<DigitalProductForm>(product),
        ProductType::Webinar => check::<WebinarForm>(product),
        _ if product.title.trim().is_empty() => Err("Title is required".to_string()),
        _ => Ok(()),
    }
}

// ----------------------------------------------------------------------------
// Champs collectés
// ----------------------------------------------------------------------------

const PROTECTED_FIELD_IDS: [&str; 2] = ["1", "2"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldEditError {
    #[error("The name and email fields cannot be changed")]
    Protected,
    #[error("Unknown field {0}")]
    Unknown(String),
}

/// Liste ordonnée des champs du formulaire public.
/// Les champs "1" (nom) et "2" (email) ne peuvent être ni supprimés ni
/// changés de type, seul leur libellé est modifiable.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList(Vec<CollectedField>);

impl Default for FieldList {
    fn default() -> Self {
        FieldList(CollectedField::defaults())
    }
}

impl FieldList {
    pub fn from_fields(fields: &[CollectedField]) -> Self {
        if fields.is_empty() {
            FieldList::default()
        } else {
            FieldList(fields.to_vec())
        }
    }

    pub fn fields(&self) -> &[CollectedField] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<CollectedField> {
        self.0
    }

    fn is_protected(id: &str) -> bool {
        PROTECTED_FIELD_IDS.contains(&id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut CollectedField, FieldEditError> {
        self.0
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| FieldEditError::Unknown(id.to_string()))
    }

    /// Ajoute un champ optionnel avec le libellé par défaut du type
    pub fn add(&mut self, field_type: FieldType) -> String {
        let next = self
            .0
            .iter()
            .filter_map(|f| f.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            .max(2)
            + 1;
        let id = next.to_string();
        self.0.push(CollectedField {
            id: id.clone(),
            field_type,
            label: field_type.default_label().to_string(),
            required: false,
            options: Vec::new(),
        });
        id
    }

    /// Un libellé vide est ignoré
    pub fn rename(&mut self, id: &str, label: &str) -> Result<(), FieldEditError> {
        let field = self.find_mut(id)?;
        if !label.trim().is_empty() {
            field.label = label.to_string();
        }
        Ok(())
    }

    pub fn change_type(&mut self, id: &str, field_type: FieldType) -> Result<(), FieldEditError> {
        if Self::is_protected(id) {
            return Err(FieldEditError::Protected);
        }
        self.find_mut(id)?.field_type = field_type;
        Ok(())
    }

    pub fn set_required(&mut self, id: &str, required: bool) -> Result<(), FieldEditError> {
        if Self::is_protected(id) {
            return Err(FieldEditError::Protected);
        }
        self.find_mut(id)?.required = required;
        Ok(())
    }

    pub fn set_options(&mut self, id: &str, options: Vec<String>) -> Result<(), FieldEditError> {
        if Self::is_protected(id) {
            return Err(FieldEditError::Protected);
        }
        self.find_mut(id)?.options = options;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), FieldEditError> {
        if Self::is_protected(id) {
            return Err(FieldEditError::Protected);
        }
        let before = self.0.len();
        self.0.retain(|f| f.id != id);
        if self.0.len() == before {
            return Err(FieldEditError::Unknown(id.to_string()));
        }
        Ok(())
    }
}

// Image/fichier: un assistant n'envoie que ce qu'il connaît
pub(crate) fn keep_or_set(value: &Option<String>) -> Patch<String> {
    match value {
        Some(v) if !v.is_empty() => Patch::Set(v.clone()),
        _ => Patch::Keep,
    }
}

pub(crate) fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub(crate) fn filled_opt(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_fields_only_accept_label_changes() {
        let mut fields = FieldList::default();

        assert_eq!(fields.remove("1"), Err(FieldEditError::Protected));
        assert_eq!(fields.change_type("2", FieldType::Text), Err(FieldEditError::Protected));
        assert_eq!(fields.set_required("2", false), Err(FieldEditError::Protected));

        fields.rename("1", "Full name").unwrap();
        fields.rename("2", "  ").unwrap();
        assert_eq!(fields.fields()[0].label, "Full name");
        assert_eq!(fields.fields()[1].label, "Email");
    }

    #[test]
    fn added_fields_get_fresh_ids_and_default_labels() {
        let mut fields = FieldList::default();
        let phone = fields.add(FieldType::Phone);
        let text = fields.add(FieldType::Text);
        assert_eq!(phone, "3");
        assert_eq!(text, "4");
        assert_eq!(fields.fields()[2].label, FieldType::Phone.default_label());
        assert!(!fields.fields()[2].required);

        fields.remove(&phone).unwrap();
        assert_eq!(fields.add(FieldType::Dropdown), "5");
        assert_eq!(fields.remove("42"), Err(FieldEditError::Unknown("42".to_string())));
    }

    #[test]
    fn navigation_is_bounded_and_gated() {
        let mut wizard = Wizard::new(LeadMagnetForm::default());
        assert!(!wizard.previous());
        assert_eq!(wizard.step(), LeadMagnetStep::Image);

        assert!(wizard.next());
        assert_eq!(wizard.step(), LeadMagnetStep::Text);
        // titre manquant: Next désactivé
        assert!(!wizard.can_go_next());
        assert!(!wizard.next());
        assert_eq!(wizard.current(), 2);

        wizard.form.title = "Free guide".to_string();
        assert!(wizard.next());
        assert!(wizard.next());
        assert!(wizard.is_last_step());
        assert!(!wizard.next());
        assert_eq!(wizard.current(), 4);

        assert!(wizard.previous());
        assert_eq!(wizard.current(), 3);
    }

    #[test]
    fn finalize_requires_last_step_and_every_gate() {
        let mut wizard = Wizard::new(LeadMagnetForm {
            title: "Free guide".to_string(),
            ..Default::default()
        });
        assert_eq!(wizard.can_finalize(), Err(LeadMagnetStep::Image));

        while wizard.next() {}
        assert!(wizard.can_finalize().is_ok());

        // un titre effacé après coup bloque toujours la publication
        wizard.form.title.clear();
        assert_eq!(wizard.can_finalize(), Err(LeadMagnetStep::Text));
    }

    #[test]
    fn save_draft_carries_current_step() {
        let mut wizard = Wizard::new(LeadMagnetForm::default());
        wizard.next();
        let input = wizard.save_draft_input();
        assert_eq!(input.current_step, Some(2));
        assert_eq!(input.product_type, Some(ProductType::FreeLead));
    }
}
