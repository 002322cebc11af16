//! Account session commands.

use linemart_storefront::auth::RegistrationForm;
use linemart_storefront::{AppError, AppShell};

use crate::output;

/// Sign in and store the token.
pub async fn login(shell: &AppShell, username: &str, password: &str) -> Result<(), AppError> {
    let user = shell.auth().login(username, password).await?;
    output::line(format!("Signed in as {} ({})", user.username, user.role));
    Ok(())
}

/// Create an account and sign in.
pub async fn register(shell: &AppShell, form: &RegistrationForm) -> Result<(), AppError> {
    let user = shell.auth().register(form).await?;
    output::line(format!("Account created. Signed in as {}", user.username));
    Ok(())
}

/// Sign out. The local session is cleared even if the backend is unreachable.
pub async fn logout(shell: &AppShell) -> Result<(), AppError> {
    shell.auth().logout().await?;
    output::line("Signed out");
    Ok(())
}

pub fn whoami(shell: &AppShell) {
    match shell.auth().current_user() {
        Some(user) if shell.auth().is_authenticated() => {
            output::line(format!("{} <{}>", user.username, user.email));
            output::line(format!("id: {}  role: {}", user.id, user.role));
        }
        _ => output::line("Not signed in"),
    }
}
