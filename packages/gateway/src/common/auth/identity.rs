use crate::common::UserId;
use crate::domains::sessions::Session;
use crate::domains::users::User;

/// Auth level of a user allowed to act on every account.
pub const SUPER_USER_LEVEL: i32 = 0;

/// Auth level assigned on registration.
pub const DEFAULT_AUTH_LEVEL: i32 = 1;

/// The account fields authorization decisions may depend on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub username: String,
    pub email_confirmed: bool,
    pub auth_level: i32,
}

impl Account {
    pub fn is_super_user(&self) -> bool {
        self.auth_level == SUPER_USER_LEVEL
    }
}

impl From<&User> for Account {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email_confirmed: user.email_confirmed,
            auth_level: user.auth_level,
        }
    }
}

/// Who is making the request
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    /// Validated from credentials on this request; nothing persisted.
    Stateless(Account),
    /// Resolved from the session cookie. The session may be anonymous.
    SessionBound {
        session: Session,
        account: Option<Account>,
    },
}

impl Caller {
    pub fn account(&self) -> Option<&Account> {
        match self {
            Caller::Anonymous => None,
            Caller::Stateless(account) => Some(account),
            Caller::SessionBound { account, .. } => account.as_ref(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.account().map(|a| a.id)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Caller::SessionBound { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Whether this caller is the given user.
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id() == Some(user_id)
    }
}
