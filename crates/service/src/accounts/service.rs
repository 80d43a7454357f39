use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{AuditAction, AuditEntry, RegisterInput, Session, UserSummary};
use super::repository::AccountRepository;
use crate::access::{Principal, Role};
use crate::errors::ServiceError;

/// Accounts service configuration.
#[derive(Clone)]
pub struct AccountConfig {
    pub jwt_secret: Option<String>,
    pub token_expiry_hours: i64,
}

/// Bearer-token claims. `role` rides in the token but the principal is
/// re-resolved against the store on each request, so a role change or
/// deactivation takes effect without waiting for expiry.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// Accounts business service independent of the web framework.
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
    cfg: AccountConfig,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>, cfg: AccountConfig) -> Self {
        Self { repo, cfg }
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::accounts::{service::{AccountService, AccountConfig}, repository::mock::MockAccountRepository};
    /// use service::accounts::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAccountRepository::default());
    /// let svc = AccountService::new(repo, AccountConfig { jwt_secret: None, token_expiry_hours: 12 });
    /// let input = RegisterInput { email: Some("a@x.com".into()), username: Some("a".into()), password: Some("p".into()), role: Some("user".into()) };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "a@x.com");
    /// ```
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserSummary, ServiceError> {
        let (email, username, password, role) = validate_registration(input)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hash(e.to_string()))?
            .to_string();

        let user = self.repo.insert_user(&email, &username, &hash, role).await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "user_registered");
        Ok(UserSummary::from(&user))
    }

    /// Admin-driven user creation: the same validated registration path,
    /// plus an audit entry. The audit append is unconditional on success.
    #[instrument(skip(self, input), fields(admin_id = %admin_id))]
    pub async fn admin_create_user(
        &self,
        admin_id: Uuid,
        input: RegisterInput,
    ) -> Result<UserSummary, ServiceError> {
        let created = self.register(input).await?;
        self.repo
            .append_audit(
                admin_id,
                Some(created.id),
                AuditAction::CreateUser,
                json!({"email": created.email}),
            )
            .await?;
        Ok(created)
    }

    /// Authenticate by email/password and issue a bearer token. Disabled
    /// accounts fail exactly like bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::Unauthorized)?;
        if !user.is_active {
            return Err(ServiceError::Unauthorized);
        }

        let parsed = PasswordHash::new(&user.password_hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(ServiceError::Unauthorized);
        }

        let secret = self
            .cfg
            .jwt_secret
            .as_deref()
            .ok_or_else(|| ServiceError::Token("jwt secret not configured".into()))?;
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_expiry_hours)).timestamp() as usize;
        let claims = Claims { sub: user.email.clone(), uid: user.id, role: user.role, exp };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| ServiceError::Token(e.to_string()))?;

        info!(user_id = %user.id, "user_logged_in");
        Ok(Session { user: UserSummary::from(&user), token })
    }

    /// Resolve a user id into a principal. Inactive accounts do not
    /// resolve: as far as permissions go they are anonymous.
    pub async fn resolve_principal(&self, id: Uuid) -> Result<Option<Principal>, ServiceError> {
        Ok(self
            .repo
            .find_by_id(id)
            .await?
            .filter(|u| u.is_active)
            .map(|u| Principal { id: u.id, role: u.role }))
    }

    /// Admin-only role change. Appends an `update_role` audit entry with
    /// the target's email.
    #[instrument(skip(self), fields(admin_id = %admin_id, target = %target))]
    pub async fn update_role(
        &self,
        admin_id: Uuid,
        target: Uuid,
        role: Role,
    ) -> Result<UserSummary, ServiceError> {
        let updated = self
            .repo
            .set_role(target, role)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        self.repo
            .append_audit(
                admin_id,
                Some(updated.id),
                AuditAction::UpdateRole,
                json!({"email": updated.email}),
            )
            .await?;
        info!(target = %updated.id, role = %role, "role_updated");
        Ok(UserSummary::from(&updated))
    }

    /// Admin-only enable/disable. The flag is validated by the caller
    /// before this runs; nothing here mutates on a missing flag.
    #[instrument(skip(self), fields(admin_id = %admin_id, target = %target))]
    pub async fn toggle_status(
        &self,
        admin_id: Uuid,
        target: Uuid,
        is_active: bool,
    ) -> Result<UserSummary, ServiceError> {
        let updated = self
            .repo
            .set_active(target, is_active)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        self.repo
            .append_audit(
                admin_id,
                Some(updated.id),
                AuditAction::ToggleStatus,
                json!({"email": updated.email, "is_active": updated.is_active}),
            )
            .await?;
        info!(target = %updated.id, is_active, "status_toggled");
        Ok(UserSummary::from(&updated))
    }

    /// One user by id, or everyone newest-joiner-first.
    pub async fn list_users(&self, id: Option<Uuid>) -> Result<Vec<UserSummary>, ServiceError> {
        match id {
            Some(id) => {
                let user = self
                    .repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("User"))?;
                Ok(vec![UserSummary::from(&user)])
            }
            None => Ok(self.repo.list_users().await?.iter().map(UserSummary::from).collect()),
        }
    }

    pub async fn activity_logs(&self) -> Result<Vec<AuditEntry>, ServiceError> {
        self.repo.list_audit().await
    }
}

fn validate_registration(input: RegisterInput) -> Result<(String, String, String, Role), ServiceError> {
    use std::str::FromStr;

    let mut problems: Vec<(&'static str, &'static str)> = Vec::new();

    let email = input.email.unwrap_or_default();
    if email.trim().is_empty() {
        problems.push(("email", "this field is required"));
    } else if !email.contains('@') {
        problems.push(("email", "enter a valid email address"));
    }
    let username = input.username.unwrap_or_default();
    if username.trim().is_empty() {
        problems.push(("username", "this field is required"));
    }
    let password = input.password.unwrap_or_default();
    if password.is_empty() {
        problems.push(("password", "this field is required"));
    }
    let role = match input.role.as_deref() {
        None | Some("") => {
            problems.push(("role", "this field is required"));
            None
        }
        Some(s) => match Role::from_str(s) {
            Ok(r) => Some(r),
            Err(_) => {
                problems.push(("role", "not a valid choice"));
                None
            }
        },
    };

    if !problems.is_empty() {
        return Err(ServiceError::fields(problems));
    }
    Ok((email, username, password, role.unwrap_or(Role::User)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repository::mock::MockAccountRepository;

    fn svc() -> (AccountService, Arc<MockAccountRepository>) {
        let repo = Arc::new(MockAccountRepository::default());
        let cfg = AccountConfig { jwt_secret: Some("test-secret".into()), token_expiry_hours: 12 };
        (AccountService::new(repo.clone(), cfg), repo)
    }

    fn registration(email: &str, role: &str) -> RegisterInput {
        RegisterInput {
            email: Some(email.into()),
            username: Some("tester".into()),
            password: Some("p".into()),
            role: Some(role.into()),
        }
    }

    #[tokio::test]
    async fn register_and_login_round_trip() {
        let (svc, _) = svc();
        let user = svc.register(registration("a@x.com", "user")).await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);

        let session = svc.login("a@x.com", "p").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_disabled_account() {
        let (svc, _) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let user = svc.register(registration("u@x.com", "user")).await.unwrap();

        assert!(matches!(svc.login("u@x.com", "wrong").await, Err(ServiceError::Unauthorized)));

        svc.toggle_status(admin.id, user.id, false).await.unwrap();
        assert!(matches!(svc.login("u@x.com", "p").await, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (svc, _) = svc();
        svc.register(registration("a@x.com", "user")).await.unwrap();
        let err = svc.register(registration("a@x.com", "user")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_reports_all_missing_fields() {
        let (svc, _) = svc();
        let err = svc.register(RegisterInput::default()).await.unwrap_err();
        let msg = err.to_string();
        for field in ["email", "username", "password", "role"] {
            assert!(msg.contains(field), "{} missing from {}", field, msg);
        }
    }

    #[tokio::test]
    async fn register_rejects_unknown_role() {
        let (svc, _) = svc();
        let err = svc.register(registration("a@x.com", "superadmin")).await.unwrap_err();
        assert!(err.to_string().contains("role: not a valid choice"));
    }

    #[tokio::test]
    async fn update_role_audits_update_role_action() {
        let (svc, repo) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let user = svc.register(registration("u@x.com", "user")).await.unwrap();

        let updated = svc.update_role(admin.id, user.id, Role::Staff).await.unwrap();
        assert_eq!(updated.role, Role::Staff);

        let logs = svc.activity_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::UpdateRole);
        assert_eq!(logs[0].details["email"], "u@x.com");
        assert_eq!(logs[0].performed_by.as_ref().unwrap().id, admin.id);
        assert_eq!(logs[0].target_user.as_ref().unwrap().id, user.id);
        assert_eq!(repo.audit_len(), 1);
    }

    #[tokio::test]
    async fn update_role_missing_target_is_not_found_and_unaudited() {
        let (svc, repo) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let err = svc.update_role(admin.id, Uuid::new_v4(), Role::Staff).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(repo.audit_len(), 0);
    }

    #[tokio::test]
    async fn toggle_status_audits_resulting_state() {
        let (svc, _) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let user = svc.register(registration("u@x.com", "user")).await.unwrap();

        let updated = svc.toggle_status(admin.id, user.id, false).await.unwrap();
        assert!(!updated.is_active);

        let logs = svc.activity_logs().await.unwrap();
        assert_eq!(logs[0].action, AuditAction::ToggleStatus);
        assert_eq!(logs[0].details["is_active"], false);
    }

    #[tokio::test]
    async fn admin_create_user_always_audits() {
        let (svc, _) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();

        let created = svc.admin_create_user(admin.id, registration("new@x.com", "staff")).await.unwrap();
        assert_eq!(created.role, Role::Staff);

        let logs = svc.activity_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::CreateUser);
        assert_eq!(logs[0].details["email"], "new@x.com");
    }

    #[tokio::test]
    async fn activity_logs_are_newest_first() {
        let (svc, _) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let user = svc.register(registration("u@x.com", "user")).await.unwrap();

        svc.update_role(admin.id, user.id, Role::Staff).await.unwrap();
        svc.toggle_status(admin.id, user.id, false).await.unwrap();

        let logs = svc.activity_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, AuditAction::ToggleStatus);
        assert_eq!(logs[1].action, AuditAction::UpdateRole);
        assert!(logs[0].timestamp >= logs[1].timestamp);
    }

    #[tokio::test]
    async fn resolve_principal_skips_inactive() {
        let (svc, _) = svc();
        let admin = svc.register(registration("admin@x.com", "admin")).await.unwrap();
        let user = svc.register(registration("u@x.com", "user")).await.unwrap();

        let p = svc.resolve_principal(user.id).await.unwrap().unwrap();
        assert_eq!(p.role, Role::User);

        svc.toggle_status(admin.id, user.id, false).await.unwrap();
        assert!(svc.resolve_principal(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_users_by_id_and_all() {
        let (svc, _) = svc();
        let a = svc.register(registration("a@x.com", "user")).await.unwrap();
        let _b = svc.register(registration("b@x.com", "user")).await.unwrap();

        let one = svc.list_users(Some(a.id)).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].email, "a@x.com");

        let all = svc.list_users(None).await.unwrap();
        assert_eq!(all.len(), 2);
        // newest joiner first
        assert!(all[0].date_joined >= all[1].date_joined);

        let err = svc.list_users(Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
