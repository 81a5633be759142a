//! Advertisement validation: cross-field structural checks.

use crate::error::ValidationError;
use crate::provider::Provider;

/// Maximum length of a context id in bytes.
pub const MAX_CONTEXT_LEN: usize = 64;

/// Check the rules an advertisement must satisfy before it can be built.
///
/// This performs:
/// - At least one provider, every provider with at least one address
/// - Context id length limit
/// - Removal only for single-provider advertisements
/// - Override only with a context id and extended providers
pub fn validate_advertisement(
    providers: &[Provider],
    context: &[u8],
    remove: bool,
    override_extended: bool,
) -> Result<(), ValidationError> {
    // 1. Providers
    if providers.is_empty() {
        return Err(ValidationError::NoProviders);
    }
    if let Some(p) = providers.iter().find(|p| p.addresses().is_empty()) {
        return Err(ValidationError::NoAddresses(*p.peer_id()));
    }

    // 2. Context length
    if context.len() > MAX_CONTEXT_LEN {
        return Err(ValidationError::ContextTooLong {
            len: context.len(),
            max: MAX_CONTEXT_LEN,
        });
    }

    // 3. Removal cannot carry extended providers
    if remove && providers.len() > 1 {
        return Err(ValidationError::RemoveWithExtendedProviders {
            count: providers.len(),
        });
    }

    // 4. Override is scoped to a context and replaces extended providers
    if override_extended {
        if context.is_empty() {
            return Err(ValidationError::OverrideWithoutContext);
        }
        if providers.len() < 2 {
            return Err(ValidationError::OverrideWithoutExtendedProviders {
                count: providers.len(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libp2p_identity::Keypair;

    fn provider(seed: u8) -> Provider {
        let peer = Keypair::ed25519_from_bytes([seed; 32])
            .unwrap()
            .public()
            .to_peer_id();
        Provider::parse(peer, &["/ip4/127.0.0.1/tcp/3000"], "bitswap", None).unwrap()
    }

    #[test]
    fn test_single_provider_ok() {
        assert!(validate_advertisement(&[provider(1)], &[], false, false).is_ok());
        assert!(validate_advertisement(&[provider(1)], &[1, 2, 3], true, false).is_ok());
    }

    #[test]
    fn test_no_providers() {
        assert_eq!(
            validate_advertisement(&[], &[], false, false),
            Err(ValidationError::NoProviders)
        );
    }

    #[test]
    fn test_context_boundary() {
        let p = [provider(1)];
        assert!(validate_advertisement(&p, &[0; 64], false, false).is_ok());
        assert_eq!(
            validate_advertisement(&p, &[0; 65], false, false),
            Err(ValidationError::ContextTooLong { len: 65, max: 64 })
        );
    }

    #[test]
    fn test_remove_with_extended() {
        assert_eq!(
            validate_advertisement(&[provider(1), provider(2)], &[], true, false),
            Err(ValidationError::RemoveWithExtendedProviders { count: 2 })
        );
    }

    #[test]
    fn test_override_rules() {
        let two = [provider(1), provider(2)];
        assert!(validate_advertisement(&two, &[9], false, true).is_ok());
        assert_eq!(
            validate_advertisement(&two, &[], false, true),
            Err(ValidationError::OverrideWithoutContext)
        );
        assert_eq!(
            validate_advertisement(&[provider(1)], &[9], false, true),
            Err(ValidationError::OverrideWithoutExtendedProviders { count: 1 })
        );
    }
}
