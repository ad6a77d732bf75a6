use std::io::Read;

use clap::Subcommand;
use timeblock_core::secrets;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the CalDAV password in the OS keyring
    Login {
        /// Password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove the stored password
    Logout,
    /// Check whether a password is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { password } => {
            let password = match password {
                Some(p) => p,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            if password.is_empty() {
                return Err("empty password".into());
            }
            secrets::set(secrets::CALDAV_PASSWORD_KEY, &password)?;
            println!("password stored");
        }
        AuthAction::Logout => {
            secrets::delete(secrets::CALDAV_PASSWORD_KEY)?;
            println!("credentials removed");
        }
        AuthAction::Status => match secrets::get(secrets::CALDAV_PASSWORD_KEY)? {
            Some(_) => println!("authenticated"),
            None => println!("no password stored"),
        },
    }
    Ok(())
}
