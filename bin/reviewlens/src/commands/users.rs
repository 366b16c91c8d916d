use reviewlens_core::Paths;
use reviewlens_storage::UserStore;

pub async fn list() -> anyhow::Result<()> {
    let store = UserStore::new(Paths::new());
    let identities = store.load_all()?;

    if identities.is_empty() {
        println!("No reviewers registered.");
        return Ok(());
    }

    println!(
        "{:<30} {:<16} {:<8} {}",
        "Email", "User ID", "Version", "Registered"
    );
    for identity in identities {
        println!(
            "{:<30} {:<16} {:<8} {}",
            identity.email, identity.user_id, identity.reviewer_version, identity.registration_date
        );
    }
    Ok(())
}
