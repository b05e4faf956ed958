/// Queue family roles and their resolved indices

use crate::device::QueueFamilyProperties;

/// Role a queue plays in the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    Graphics,
    Presentation,
}

/// Family index chosen for each queue role
///
/// Both roles may resolve to the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub presentation: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scan families in index order and stop as soon as both roles resolve
    ///
    /// A family able to present sets the presentation index and a family
    /// with graphics support sets the graphics index; the last matching
    /// family before completion wins each role.
    pub fn from_families(families: &[QueueFamilyProperties]) -> Self {
        let mut indices = Self::default();
        for (index, family) in families.iter().enumerate() {
            let index = index as u32;
            if family.presentation {
                indices.presentation = Some(index);
            }
            if family.graphics {
                indices.graphics = Some(index);
            }
            if indices.is_complete() {
                break;
            }
        }
        indices
    }

    pub fn get(&self, role: QueueRole) -> Option<u32> {
        match role {
            QueueRole::Graphics => self.graphics,
            QueueRole::Presentation => self.presentation,
        }
    }

    /// Both roles resolved
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.presentation.is_some()
    }

    /// Both roles resolved to the same family
    pub fn shares_family(&self) -> bool {
        self.is_complete() && self.graphics == self.presentation
    }
}

#[cfg(test)]
#[path = "queue_family_tests.rs"]
mod tests;
