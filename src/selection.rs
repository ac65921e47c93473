//! Selection of the solved field
//!
//! Exactly one field at a time can be solved by the meter. That field is
//! read-only, every other field of the configured [`FieldSet`] is editable.

use crate::{LightMeterError, Result, SolveTarget};

/// The fields offered by the meter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldSet {
    /// ISO, shutter, aperture and exposure compensation.
    #[default]
    Full,
    /// ISO, shutter and aperture. Exposure compensation is fixed at zero.
    WithoutCompensation,
}

impl FieldSet {
    /// The fields that are part of this set, in display order.
    pub fn fields(self) -> &'static [SolveTarget] {
        match self {
            FieldSet::Full => &SolveTarget::ALL,
            FieldSet::WithoutCompensation => {
                &[SolveTarget::Iso, SolveTarget::Shutter, SolveTarget::Aperture]
            }
        }
    }

    pub fn contains(self, field: SolveTarget) -> bool {
        self.fields().contains(&field)
    }
}

/// Tracks which field, if any, is currently solved.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Selection {
    field_set: FieldSet,
    active: Option<SolveTarget>,
}

impl Selection {
    /// Creates a selection with nothing selected.
    pub fn new(field_set: FieldSet) -> Self {
        Self {
            field_set,
            active: None,
        }
    }

    /// Select `target`, deselecting whatever was selected before.
    pub fn select(&mut self, target: SolveTarget) -> Result<()> {
        if !self.field_set.contains(target) {
            return Err(LightMeterError::TargetUnavailable);
        }

        self.active = Some(target);
        Ok(())
    }

    /// Select `target` unless it is already selected, in which case nothing is
    /// selected afterwards.
    pub fn toggle(&mut self, target: SolveTarget) -> Result<()> {
        if self.active == Some(target) {
            self.clear();
            Ok(())
        } else {
            self.select(target)
        }
    }

    /// Deselect everything, making all fields editable.
    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<SolveTarget> {
        self.active
    }

    pub fn is_selected(&self, field: SolveTarget) -> bool {
        self.active == Some(field)
    }

    /// Whether the user may edit `field`.
    pub fn is_editable(&self, field: SolveTarget) -> bool {
        self.field_set.contains(field) && !self.is_selected(field)
    }

    pub fn field_set(&self) -> FieldSet {
        self.field_set
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(FieldSet::default())
    }
}
