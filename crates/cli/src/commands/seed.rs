//! Demo data: one agency managed by one of its two agents.
//!
//! Slugs are allocated the same way the dashboard does, so running the seed
//! twice yields suffixed slugs rather than conflicts. Agency emails are unique,
//! so the second run stops at the agency.

use vitrine_core::{ActivityAction, ActivityEntity, ActivityStatus, Email};
use vitrine_server::config::TenancyConfig;
use vitrine_server::db::{AgencyRepository, AgentRepository};
use vitrine_server::middleware::tenant::TenantResolver;
use vitrine_server::models::{AgencyFields, AgentFields};
use vitrine_server::services::{ActivityLogger, SYSTEM_AUTHOR, slugs};

use super::connect;

struct DemoAgent {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone: &'static str,
    bio: &'static str,
}

const AGENTS: [DemoAgent; 2] = [
    DemoAgent {
        first_name: "Paul",
        last_name: "Durand",
        email: "paul.durand@agence-du-port.fr",
        phone: "06 12 34 56 78",
        bio: "Twenty years selling family homes around the old harbour.",
    },
    DemoAgent {
        first_name: "Claire",
        last_name: "Martin",
        email: "claire.martin@agence-du-port.fr",
        phone: "06 98 76 54 32",
        bio: "Apartments and investment properties in the city centre.",
    },
];

/// Insert the demo agency and agents.
///
/// # Errors
///
/// Returns an error if `ROOT_DOMAIN` is unset, the database is unreachable or
/// a row cannot be written.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let tenants = TenantResolver::new(&TenancyConfig::from_env()?);
    let agents = AgentRepository::new(&pool);
    let agencies = AgencyRepository::new(&pool);
    let log = ActivityLogger::new(&pool);

    let mut agency_fields = AgencyFields {
        name: "Agence du Port".to_string(),
        address: "12 quai de la Douane".to_string(),
        city: "Brest".to_string(),
        zip_code: "29200".to_string(),
        phone: "02 98 00 00 00".to_string(),
        email: Email::parse_normalized("contact@agence-du-port.fr")?,
        manager_id: None,
    };
    let agency_slug = slugs::allocate(&pool, &tenants, &agency_fields.name, None).await?;
    let agency = agencies.create(&agency_fields, &agency_slug).await?;
    log.record(
        SYSTEM_AUTHOR,
        ActivityAction::Create,
        ActivityEntity::Agency,
        &agency.name,
        ActivityStatus::Success,
        None,
    )
    .await;
    tracing::info!(slug = %agency.slug, "Agency created");

    let mut manager = None;
    for demo in &AGENTS {
        let fields = AgentFields {
            first_name: demo.first_name.to_string(),
            last_name: demo.last_name.to_string(),
            email: Email::parse_normalized(demo.email)?,
            phone: demo.phone.to_string(),
            photo_url: None,
            city: "Brest".to_string(),
            zip_code: "29200".to_string(),
            secondary_sector: Some("Plougastel-Daoulas".to_string()),
            facebook_url: None,
            instagram_url: None,
            linkedin_url: None,
            bio: Some(demo.bio.to_string()),
            agency_id: Some(agency.id),
        };
        let slug = slugs::allocate(&pool, &tenants, &fields.full_name(), None).await?;
        let agent = agents.create(&fields, &slug).await?;
        log.record(
            SYSTEM_AUTHOR,
            ActivityAction::Create,
            ActivityEntity::Agent,
            &agent.full_name(),
            ActivityStatus::Success,
            None,
        )
        .await;
        tracing::info!(slug = %agent.slug, "Agent created");
        manager.get_or_insert(agent.id);
    }

    agency_fields.manager_id = manager;
    let agency = agencies.update(agency.id, &agency_fields, &agency.slug).await?;
    log.record(
        SYSTEM_AUTHOR,
        ActivityAction::Update,
        ActivityEntity::Agency,
        &agency.name,
        ActivityStatus::Success,
        None,
    )
    .await;

    tracing::info!("Seed complete!");
    pool.close().await;
    Ok(())
}
