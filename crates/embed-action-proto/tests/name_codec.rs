// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests for wire name encoding.

use embed_action_proto::{decode, encode, ActionName, NameCodec, NameScheme};
use proptest::prelude::*;

proptest! {
    #[test]
    fn legacy_decode_inverts_encode_without_separators(
        namespace in "[^:]{0,16}",
        action_type in "[^:]{0,16}",
    ) {
        let wire = encode(&namespace, &action_type);
        prop_assert_eq!(decode(&wire), Some(ActionName::new(namespace, action_type)));
    }

    #[test]
    fn encode_is_deterministic(namespace in ".{0,16}", action_type in ".{0,16}") {
        prop_assert_eq!(encode(&namespace, &action_type), encode(&namespace, &action_type));
    }

    #[test]
    fn escaped_decode_inverts_encode_for_any_field(
        namespace in ".{0,16}",
        action_type in ".{0,16}",
    ) {
        let codec = NameCodec::escaped();
        let name = ActionName::new(namespace, action_type);
        prop_assert_eq!(codec.decode(&codec.encode(&name)), Some(name));
    }

    #[test]
    fn schemes_agree_on_plain_fields(
        namespace in "[A-Za-z0-9_-]{0,16}",
        action_type in "[A-Za-z0-9_*-]{0,16}",
    ) {
        let legacy = NameCodec::new("CAL", NameScheme::Legacy);
        let escaped = NameCodec::new("CAL", NameScheme::Escaped);
        prop_assert_eq!(
            legacy.full_name(&namespace, &action_type),
            escaped.full_name(&namespace, &action_type)
        );
    }

    #[test]
    fn foreign_prefixes_never_decode(prefix in "[A-Z]{1,6}", rest in "[a-z:]{0,12}") {
        prop_assume!(prefix != "CAL");
        let wire = format!("{prefix}:{rest}");
        prop_assert_eq!(decode(&wire), None);
        prop_assert_eq!(NameCodec::escaped().decode(&wire), None);
    }
}
