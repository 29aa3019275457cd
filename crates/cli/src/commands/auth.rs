//! Authentication and profile commands.

use clap::Args;
use shopcart_client::SessionManager;
use shopcart_client::api::{ProfilePatch, User, UserAddress};

use super::CommandError;

/// Arguments for `shopcart profile`.
#[derive(Args)]
pub struct ProfileArgs {
    /// New display name
    #[arg(short, long)]
    pub name: String,

    /// Street address
    #[arg(long)]
    pub street: Option<String>,

    /// City
    #[arg(long)]
    pub city: Option<String>,

    /// State or province
    #[arg(long)]
    pub state: Option<String>,

    /// ZIP or postal code
    #[arg(long)]
    pub zip: Option<String>,

    /// Country
    #[arg(long)]
    pub country: Option<String>,
}

pub async fn login(
    session: &SessionManager,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let user = session.login(email, password).await?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn register(
    session: &SessionManager,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let user = session.register(name, email, password).await?;
    println!("Welcome, {}! Account created for {}", user.name, user.email);
    Ok(())
}

pub fn logout(session: &SessionManager) {
    session.logout();
    println!("Logged out");
}

pub fn whoami(session: &SessionManager) {
    match session.state().user() {
        Some(user) => print_user(user),
        None => println!("Not logged in"),
    }
}

pub async fn update_profile(
    session: &SessionManager,
    args: ProfileArgs,
) -> Result<(), CommandError> {
    let address = build_address(&args)?;
    let patch = ProfilePatch {
        name: args.name,
        address,
    };
    let user = session.update_profile(&patch).await?;
    println!("Profile updated");
    print_user(&user);
    Ok(())
}

/// All-or-nothing: either no address flags, or all of them.
fn build_address(args: &ProfileArgs) -> Result<Option<UserAddress>, CommandError> {
    let parts = [
        &args.street,
        &args.city,
        &args.state,
        &args.zip,
        &args.country,
    ];
    if parts.iter().all(|p| p.is_none()) {
        return Ok(None);
    }
    if parts.iter().any(|p| p.is_none()) {
        return Err(CommandError::InvalidInput(
            "address requires --street, --city, --state, --zip, and --country".to_string(),
        ));
    }

    Ok(Some(UserAddress {
        street: args.street.clone().unwrap_or_default(),
        city: args.city.clone().unwrap_or_default(),
        state: args.state.clone().unwrap_or_default(),
        zip_code: args.zip.clone().unwrap_or_default(),
        country: args.country.clone().unwrap_or_default(),
    }))
}

fn print_user(user: &User) {
    println!("{} <{}> ({})", user.name, user.email, user.role);
    if let Some(address) = &user.address {
        println!(
            "  {}, {}, {} {}, {}",
            address.street, address.city, address.state, address.zip_code, address.country
        );
    }
}
