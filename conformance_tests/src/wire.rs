//! Wire-format conformance: badge and message-word properties.
