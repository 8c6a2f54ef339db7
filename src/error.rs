//! The closed error taxonomy. `verify` never returns one of these for
//! an ordinary signature mismatch — it returns `false` — these are reserved
//! for structural and lifecycle failures.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmssError {
    /// An unknown lifetime tag was given to `Scheme::new` / `parse_tag`.
    InvalidLifetime,
    /// The seed supplied was not exactly 32 bytes.
    InvalidSeed,
    /// A wire-encoded field element was `>= p`.
    InvalidFieldElement,
    /// A decoded structure had the wrong length or non-zero trailing
    /// padding where zero was required.
    InvalidEncoding { context: &'static str },
    /// `sign` was called for an epoch outside `[activation_epoch,
    /// activation_epoch + num_active_epochs)`.
    KeyNotActive { epoch: u64, activation_epoch: u64, num_active_epochs: u64 },
    /// `epoch >= 2^L` for the scheme's lifetime preset.
    EpochTooLarge { epoch: u64, max_epochs: u64 },
    /// The randomness search for a valid codeword exceeded its attempt
    /// bound.
    RandomnessExhausted { attempts: u32 },
    /// The secret key and public key disagree on `P`.
    ParameterMismatch,
    /// An internal invariant of the permutation or tree builder was
    /// violated; this should be unreachable and is treated as fatal.
    InternalHashFailure,
}

impl fmt::Display for XmssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLifetime => write!(f, "unknown lifetime tag"),
            Self::InvalidSeed => write!(f, "seed must be exactly 32 bytes"),
            Self::InvalidFieldElement => write!(f, "wire-encoded field element is not canonical"),
            Self::InvalidEncoding { context } => write!(f, "invalid encoding: {context}"),
            Self::KeyNotActive { epoch, activation_epoch, num_active_epochs } => write!(
                f,
                "epoch {epoch} is outside the active range [{activation_epoch}, {})",
                activation_epoch + num_active_epochs
            ),
            Self::EpochTooLarge { epoch, max_epochs } => {
                write!(f, "epoch {epoch} exceeds lifetime bound {max_epochs}")
            }
            Self::RandomnessExhausted { attempts } => {
                write!(f, "no valid codeword found after {attempts} randomness attempts")
            }
            Self::ParameterMismatch => write!(f, "secret key and public key parameters disagree"),
            Self::InternalHashFailure => write!(f, "internal hash invariant violated"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for XmssError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_does_not_panic() {
        let errors = [
            XmssError::InvalidLifetime,
            XmssError::InvalidSeed,
            XmssError::InvalidFieldElement,
            XmssError::InvalidEncoding { context: "signature" },
            XmssError::KeyNotActive { epoch: 5, activation_epoch: 0, num_active_epochs: 4 },
            XmssError::EpochTooLarge { epoch: 99, max_epochs: 16 },
            XmssError::RandomnessExhausted { attempts: 1 << 20 },
            XmssError::ParameterMismatch,
            XmssError::InternalHashFailure,
        ];
        for e in errors {
            let _ = alloc::format!("{e}");
        }
    }
}
