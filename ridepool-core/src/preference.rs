//! Rider and driver compatibility preferences.

/// Self-declared gender used by the same-gender preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Gender {
    /// Male.
    #[default]
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Preferences attached to an offer or a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Preference {
    /// Gender of the person holding the preference.
    pub gender: Gender,
    /// Only share the ride with people of the same gender.
    pub same_gender: bool,
    /// Smoking is acceptable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allows_smoking: bool,
    /// Pets are acceptable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allows_pets: bool,
}

impl Preference {
    /// Symmetric compatibility: if either side insists on a same-gender ride
    /// the genders must agree.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        if self.gender == other.gender {
            return true;
        }
        !(self.same_gender || other.same_gender)
    }
}
