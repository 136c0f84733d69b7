//! Initial administrator provisioning
//!
//! Used by `iepf seed-admin` and by the test router. Seeding is idempotent:
//! an existing account with the configured email is left untouched.

use crate::auth::password::PasswordHasher;
use iepf_core::{AdminSeedConfig, IepfError, NewUser, User, UserRepository, UserRole};

/// What [`seed_admin`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(User),
    AlreadyExists { email: String },
}

/// Create the administrator described by `config` unless the email is taken
pub async fn seed_admin(
    users: &dyn UserRepository,
    passwords: &PasswordHasher,
    config: &AdminSeedConfig,
) -> anyhow::Result<SeedOutcome> {
    let (Some(email), Some(password)) = (config.email.as_deref(), config.password.as_deref())
    else {
        anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set to seed an admin user");
    };

    if users.find_by_email(email).await?.is_some() {
        return Ok(SeedOutcome::AlreadyExists {
            email: email.to_string(),
        });
    }

    let password_hash = passwords.hash(password).await?;

    let created = users
        .create_user(NewUser {
            email: email.to_string(),
            first_name: config.first_name.clone(),
            last_name: config.last_name.clone(),
            password_hash,
            role: UserRole::Admin,
        })
        .await;

    match created {
        Ok(user) => Ok(SeedOutcome::Created(user)),
        // Lost a race with another seeder
        Err(IepfError::Conflict { .. }) => Ok(SeedOutcome::AlreadyExists {
            email: email.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordConfig;
    use iepf_core::InMemoryStore;

    fn config(email: Option<&str>, password: Option<&str>) -> AdminSeedConfig {
        AdminSeedConfig {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seed_creates_admin_once() {
        let store = InMemoryStore::new();
        let passwords = PasswordHasher::with_config("pepper", PasswordConfig::fast());
        let config = config(Some("admin@example.com"), Some("Adm1nPassw0rd"));

        let outcome = seed_admin(&store, &passwords, &config).await.unwrap();
        let SeedOutcome::Created(admin) = outcome else {
            panic!("expected a new admin, got {outcome:?}");
        };
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.first_name, "Admin");
        assert_eq!(admin.last_name, "User");
        assert!(passwords
            .verify(&admin.password_hash, "Adm1nPassw0rd")
            .await
            .unwrap());

        let again = seed_admin(&store, &passwords, &config).await.unwrap();
        assert_eq!(
            again,
            SeedOutcome::AlreadyExists {
                email: "admin@example.com".to_string()
            }
        );
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_requires_email_and_password() {
        let store = InMemoryStore::new();
        let passwords = PasswordHasher::with_config("pepper", PasswordConfig::fast());

        assert!(seed_admin(&store, &passwords, &config(None, Some("Adm1nPassw0rd")))
            .await
            .is_err());
        assert!(seed_admin(&store, &passwords, &config(Some("admin@example.com"), None))
            .await
            .is_err());
    }
}
