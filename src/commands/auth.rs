use anyhow::{bail, Result};
use std::io::{self, Write};

use crate::commands::read_stdin_line;
use crate::session::{SessionState, SessionStore};

pub async fn login(session: &mut SessionStore, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password().await?,
    };

    let user = session.login(username, &password).await?;
    println!("Logged in as {} ({})", user.display_name(), user.role);
    Ok(())
}

async fn prompt_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;

    let input = read_stdin_line().await?;
    let password = input.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(password)
}

pub fn logout(session: &mut SessionStore) {
    session.logout();
    println!("Logged out.");
}

pub async fn whoami(session: &mut SessionStore) -> Result<()> {
    match session.resolve().await {
        SessionState::Authenticated(user) => {
            println!("User #{}: {}", user.id, user.display_name());
            println!("Username: {}", user.username);
            if let Some(email) = &user.email {
                println!("Email: {}", email);
            }
            println!("Role: {}", user.role);
            if let Some(dept) = user.department_id {
                println!("Department: #{}", dept);
            }
            let reference = if user.can_create_reference_data() {
                "enabled"
            } else {
                "disabled"
            };
            println!("Create departments/projects: {}", reference);
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::testing::FakeBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_with_password_flag() {
        let backend = Arc::new(FakeBackend::new());
        let mut session = fixtures::anonymous(&backend);

        login(&mut session, "admin", Some("admin123")).await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_bad_password_reports_error() {
        let backend = Arc::new(FakeBackend::new());
        let mut session = fixtures::anonymous(&backend);

        let err = login(&mut session, "admin", Some("nope")).await.unwrap_err();
        assert!(err.to_string().contains("Incorrect username or password"));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_twice() {
        let backend = Arc::new(FakeBackend::new());
        let mut session = fixtures::logged_in(&backend).await;
        logout(&mut session);
        logout(&mut session);
        assert_eq!(session.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_whoami_anonymous_is_ok() {
        let backend = Arc::new(FakeBackend::new());
        let mut session = fixtures::anonymous(&backend);
        assert!(whoami(&mut session).await.is_ok());
    }
}
