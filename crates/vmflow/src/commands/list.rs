use crate::session::Session;
use crate::workflow::listing;

pub async fn handle(session: &Session) -> anyhow::Result<()> {
    listing::list_vms(session).await?;
    Ok(())
}
