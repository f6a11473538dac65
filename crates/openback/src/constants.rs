use crate::grant::Action;

/// Scheme prefix a payment pointer's leading `$` expands to.
pub const PAYMENT_POINTER_SCHEME: &str = "https://";

/// Authorization scheme used for every GNAP-protected request.
pub const GNAP_AUTH_SCHEME: &str = "GNAP";

/// Interaction start/finish mode used for outgoing-payment grants.
pub const REDIRECT_INTERACTION: &str = "redirect";

/// Quote method accepted by Interledger resource servers.
pub const ILP_QUOTE_METHOD: &str = "ilp";

/// Default timeout for a single upstream call.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

pub const OUTGOING_PAYMENT_ACTIONS: &[Action] = &[
    Action::List,
    Action::ListAll,
    Action::Read,
    Action::ReadAll,
    Action::Create,
];

pub const INCOMING_PAYMENT_ACTIONS: &[Action] = &[Action::Read, Action::Create, Action::Complete];

pub const QUOTE_ACTIONS: &[Action] = &[Action::Create, Action::Read, Action::ReadAll];
