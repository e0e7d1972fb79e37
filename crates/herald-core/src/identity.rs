use std::{fmt, str};

use snafu::{OptionExt as _, Snafu, ensure};

/// The authenticated account a timeline (and its cache) belongs to
///
/// Always validated: the identity ends up as a directory name in the cache,
/// so it can't contain path separators or start with `.`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    account_id: String,
    domain: String,
}

impl Identity {
    pub fn new(
        account_id: impl Into<String>,
        domain: impl Into<String>,
    ) -> Result<Self, IdentityParseError> {
        let account_id = account_id.into();
        let domain = domain.into();

        ensure!(!account_id.is_empty(), EmptyAccountIdSnafu);
        ensure!(
            !domain.is_empty()
                && !domain.starts_with('.')
                && domain
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':'),
            InvalidDomainSnafu { domain }
        );
        ensure!(
            !account_id.contains(['/', '\\', '\0']) && !account_id.starts_with('.'),
            InvalidAccountIdSnafu { account_id }
        );

        Ok(Self { account_id, domain })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.domain)
    }
}

#[derive(Debug, Snafu)]
pub enum IdentityParseError {
    #[snafu(display("Identity must have the form <account_id>@<domain>"))]
    MissingSeparator,
    #[snafu(display("Identity has an empty account id"))]
    EmptyAccountId,
    #[snafu(display("Identity has an invalid account id: {account_id}"))]
    InvalidAccountId { account_id: String },
    #[snafu(display("Identity has an invalid domain: {domain}"))]
    InvalidDomain { domain: String },
}

impl str::FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account_id, domain) = s.rsplit_once('@').context(MissingSeparatorSnafu)?;
        Self::new(account_id, domain)
    }
}
