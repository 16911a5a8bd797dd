use crate::CryptoError;

/// Security level of the hash-based signature golden model.
///
/// Levels follow the NIST categories: 1 (128-bit), 3 (192-bit), 5 (256-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityLevel {
    Level1,
    Level3,
    Level5,
}

impl SecurityLevel {
    /// All supported levels, lowest first.
    pub const ALL: [SecurityLevel; 3] = [Self::Level1, Self::Level3, Self::Level5];

    /// NIST category number.
    pub fn as_u8(self) -> u8 {
        match self {
            SecurityLevel::Level1 => 1,
            SecurityLevel::Level3 => 3,
            SecurityLevel::Level5 => 5,
        }
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = CryptoError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(SecurityLevel::Level1),
            3 => Ok(SecurityLevel::Level3),
            5 => Ok(SecurityLevel::Level5),
            _ => Err(CryptoError::UnsupportedParameter(
                "security level must be 1, 3 or 5",
            )),
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "level-{}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_u8() {
        for level in SecurityLevel::ALL {
            assert_eq!(SecurityLevel::try_from(level.as_u8()), Ok(level));
        }
        for bad in [0u8, 2, 4, 6, 255] {
            assert!(matches!(
                SecurityLevel::try_from(bad),
                Err(CryptoError::UnsupportedParameter(_))
            ));
        }
    }

    #[test]
    fn test_level_display() {
        assert_eq!(SecurityLevel::Level3.to_string(), "level-3");
    }
}
