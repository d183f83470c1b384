//! Proposal pipeline: lead, client, proposal, stage flag and address
//! written as one unit of work.
//!
//! The form is validated before anything touches the database. Every
//! subsequent step runs on the same connection inside one IMMEDIATE
//! transaction; the first failing step rolls back everything before it.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{application, branch, client, lead, product, proposal};
use crate::db::{in_transaction, DatabaseError};
use crate::identifiers::{self, IdentifierError};
use crate::models::enums::{AddressType, Stage};
use crate::models::*;
use crate::process::{self, ProcessError};

const MAX_NAME_LEN: usize = 100;

static PAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN pattern"));
static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern"));
static PINCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("pincode pattern"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

impl PipelineError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════

pub fn validate_applicant(applicant: &ApplicantForm) -> Result<(), PipelineError> {
    let name = applicant.name.trim();
    if name.is_empty() {
        return Err(PipelineError::invalid("name", "Applicant name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(PipelineError::invalid(
            "name",
            format!("Applicant name exceeds {MAX_NAME_LEN} characters"),
        ));
    }
    if !PAN_PATTERN.is_match(&applicant.pan) {
        return Err(PipelineError::invalid("pan", format!("'{}' is not a valid PAN", applicant.pan)));
    }
    if !MOBILE_PATTERN.is_match(&applicant.mobile) {
        return Err(PipelineError::invalid("mobile", "Mobile number must be 10 digits"));
    }
    if let Some(email) = applicant.email.as_deref().filter(|e| !e.is_empty()) {
        if !EMAIL_PATTERN.is_match(email) {
            return Err(PipelineError::invalid("email", format!("'{email}' is not a valid email")));
        }
    }
    Ok(())
}

pub fn validate_address(address: &AddressForm) -> Result<(), PipelineError> {
    if address.line1.trim().is_empty() {
        return Err(PipelineError::invalid("address", "Address line is required"));
    }
    if address.city.trim().is_empty() {
        return Err(PipelineError::invalid("city", "City is required"));
    }
    if !PINCODE_PATTERN.is_match(&address.pincode) {
        return Err(PipelineError::invalid("pincode", "Pincode must be 6 digits"));
    }
    Ok(())
}

pub fn validate_form(form: &ProposalForm) -> Result<(), PipelineError> {
    if form.branch_id.trim().is_empty() {
        return Err(PipelineError::invalid("branch", "Branch is required"));
    }
    if !(form.amount.is_finite() && form.amount > 0.0) {
        return Err(PipelineError::invalid("amount", "Loan amount must be greater than zero"));
    }
    validate_applicant(&form.applicant)?;
    validate_address(&form.address)
}

/// The branch, and the product when given, must belong to `company_id`.
pub fn check_ownership(
    conn: &Connection,
    branch_id: &str,
    product_id: Option<i64>,
    company_id: i64,
) -> Result<(), PipelineError> {
    if branch::branch_company(conn, branch_id)? != Some(company_id) {
        return Err(PipelineError::invalid(
            "branch",
            format!("Branch {branch_id} does not belong to this company"),
        ));
    }
    if let Some(product_id) = product_id {
        if product::product_company(conn, product_id)? != Some(company_id) {
            return Err(PipelineError::invalid(
                "product",
                format!("Product {product_id} does not belong to this company"),
            ));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Entity creators
// ═══════════════════════════════════════════

/// Insert a lead (term 0) and initialize its process record in the same
/// transaction. Branch and product must be the actor's company's.
pub fn create_lead(conn: &Connection, new_lead: &NewLead, actor: &Actor) -> Result<LeadCreated, PipelineError> {
    in_transaction(conn, |tx| -> Result<LeadCreated, PipelineError> {
        check_ownership(tx, &new_lead.branch_id, new_lead.product_id, actor.company_id)?;
        let lead_id = lead::insert_lead(tx, new_lead, actor.company_id, actor.user_id, &Utc::now())?;
        let app_id = process::initialize_process(tx, lead_id, actor)?;
        tracing::debug!(lead_id, %app_id, "Lead created");
        Ok(LeadCreated { lead_id, app_id })
    })
}

/// Create the client row for `lead_id`, deduplicated by PAN within the
/// actor's company.
pub fn create_client(
    conn: &Connection,
    applicant: &ApplicantForm,
    lead_id: i64,
    actor: &Actor,
) -> Result<ClientCreated, PipelineError> {
    in_transaction(conn, |tx| -> Result<ClientCreated, PipelineError> {
        let created = client::create_client(
            tx,
            applicant,
            actor.company_id,
            lead_id,
            actor.user_id,
            &Utc::now(),
        )?;
        tracing::debug!(client_id = created.client_id, tag = %created.tag, "Client created");
        Ok(created)
    })
}

// ═══════════════════════════════════════════
// Proposal
// ═══════════════════════════════════════════

/// Create a proposal from a submitted form.
///
/// Lead, process record, client, proposal, `proposal_process` flag, client
/// back-link and permanent address all commit together or not at all.
pub fn create_proposal(
    conn: &Connection,
    form: &ProposalForm,
    actor: &Actor,
) -> Result<ProposalCreated, PipelineError> {
    validate_form(form)?;
    let abbr = identifiers::normalize_abbreviation(&actor.company_abbr)?;

    let created = in_transaction(conn, |tx| -> Result<ProposalCreated, PipelineError> {
        let now = Utc::now();
        let new_lead = NewLead {
            branch_id: form.branch_id.clone(),
            product_id: form.product_id,
            name: form.applicant.name.trim().to_string(),
            mobile: form.applicant.mobile.clone(),
            pan: form.applicant.pan.clone(),
            amount: form.amount,
        };
        let LeadCreated { lead_id, app_id } = create_lead(tx, &new_lead, actor)?;

        let client = create_client(tx, &form.applicant, lead_id, actor)?;

        let prop_no = identifiers::proposal_number(&abbr, lead_id)?;
        let prop_id = proposal::insert_proposal(
            tx,
            &NewProposal {
                prop_no: prop_no.clone(),
                app_id,
                lead_id,
                client_id: client.client_id,
                branch_id: form.branch_id.clone(),
                product_id: form.product_id,
                amount: form.amount,
                created_by: actor.user_id,
            },
            &now,
        )?;
        application::attach_proposal(tx, &app_id, prop_id)?;

        let keys = ApplicationKeys::lead(lead_id).with_prop(prop_id);
        process::update_process(tx, Stage::ProposalProcess, 1, &keys, actor)?;

        client::link_proposal(tx, client.row_id, prop_id)?;
        client::insert_address(tx, &client, AddressType::Permanent, &form.address, &now)?;

        Ok(ProposalCreated {
            app_id,
            lead_id,
            prop_id,
            prop_no,
            client_id: client.client_id,
            client_tag: client.tag,
        })
    })?;

    tracing::info!(
        prop_id = created.prop_id,
        prop_no = %created.prop_no,
        lead_id = created.lead_id,
        client_tag = %created.client_tag,
        user_id = actor.user_id,
        "Proposal created"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::client::{get_addresses, get_client_for_proposal};
    use crate::models::enums::ClientTag;
    use crate::test_support::{fail_on, Fixture};

    const PIPELINE_TABLES: [&str; 7] = [
        "leads",
        "applications",
        "process_state",
        "client",
        "client_id_seq",
        "proposals",
        "client_address",
    ];

    fn assert_nothing_written(fx: &Fixture) {
        for table in PIPELINE_TABLES {
            assert_eq!(fx.count(table), 0, "{table} should be empty after rollback");
        }
    }

    #[test]
    fn creates_every_entity_of_a_proposal() {
        let fx = Fixture::new();
        let created = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor()).unwrap();

        assert_eq!(created.prop_no.len(), identifiers::PROPOSAL_NUMBER_WIDTH);
        assert!(created.prop_no.starts_with("ABC"));
        assert!(created.prop_no.ends_with(&created.lead_id.to_string()));
        assert_eq!(created.client_tag, ClientTag::New);

        let proposal = proposal::get_proposal(&fx.conn, created.prop_id).unwrap().unwrap();
        assert_eq!(proposal.status, STATUS_PENDING_APPROVAL);
        assert_eq!(proposal.lead_id, created.lead_id);
        assert_eq!(proposal.client_id, created.client_id);
        assert_eq!(proposal.app_id, created.app_id);

        let lead = lead::get_lead(&fx.conn, created.lead_id).unwrap().unwrap();
        assert_eq!(lead.term, 0);
        assert_eq!(lead.pan, "ABCDE1234F");

        let client = get_client_for_proposal(&fx.conn, created.prop_id).unwrap().unwrap();
        assert_eq!(client.lead_id, created.lead_id);
        let addresses = get_addresses(&fx.conn, client.id).unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].address_type, AddressType::Permanent);

        let app = application::get_application(&fx.conn, &created.app_id).unwrap().unwrap();
        assert_eq!(app.prop_id, Some(created.prop_id));

        let log = process::get_process_log(&fx.conn, &ApplicationKeys::proposal(created.prop_id)).unwrap();
        assert_eq!(log.entries[0].status, 1);
        assert_eq!(log.entries[1].stage, Stage::ProposalProcess);
        assert_eq!(log.entries[1].status, 1);
        assert_eq!(log.entries[1].by, Some(fx.user_id));
        assert_eq!(log.current_process, CurrentStage::Pending(Stage::KycProcess));
    }

    #[test]
    fn repeat_applicant_reuses_client_id() {
        let fx = Fixture::new();
        let first = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor()).unwrap();
        let second = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor()).unwrap();
        let other = create_proposal(&fx.conn, &fx.proposal_form("PQRST6789Z"), &fx.actor()).unwrap();

        assert_eq!(second.client_tag, ClientTag::Existing);
        assert_eq!(second.client_id, first.client_id);
        assert_ne!(second.prop_no, first.prop_no);
        assert_eq!(other.client_tag, ClientTag::New);
        assert_ne!(other.client_id, first.client_id);
        assert_eq!(fx.count("client"), 3);
        assert_eq!(fx.count("client_id_seq"), 2);
    }

    #[test]
    fn invalid_form_writes_nothing() {
        let fx = Fixture::new();
        let actor = fx.actor();

        let mut form = fx.proposal_form("ABCDE1234");
        let err = create_proposal(&fx.conn, &form, &actor).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "pan", .. }));

        form = fx.proposal_form("ABCDE1234F");
        form.amount = 0.0;
        let err = create_proposal(&fx.conn, &form, &actor).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "amount", .. }));

        form = fx.proposal_form("ABCDE1234F");
        form.applicant.mobile = "98765".into();
        assert!(create_proposal(&fx.conn, &form, &actor).is_err());

        form = fx.proposal_form("ABCDE1234F");
        form.address.pincode = "5600".into();
        assert!(create_proposal(&fx.conn, &form, &actor).is_err());

        form = fx.proposal_form("ABCDE1234F");
        form.applicant.name = "   ".into();
        assert!(create_proposal(&fx.conn, &form, &actor).is_err());

        assert_nothing_written(&fx);
    }

    #[test]
    fn validation_messages_name_the_field() {
        let mut applicant = crate::test_support::applicant("ABCDE1234F");
        applicant.name = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate_applicant(&applicant).unwrap_err();
        assert_eq!(err.to_string(), "Invalid name: Applicant name exceeds 100 characters");

        applicant = crate::test_support::applicant("ABCDE1234F");
        applicant.email = Some("not-an-email".into());
        assert!(matches!(
            validate_applicant(&applicant),
            Err(PipelineError::Validation { field: "email", .. })
        ));
        applicant.email = Some(String::new());
        assert!(validate_applicant(&applicant).is_ok());
    }

    #[test]
    fn bad_company_abbreviation_writes_nothing() {
        let fx = Fixture::new();
        let actor = Actor::new(fx.user_id, fx.company_id, "A-C");
        let err = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &actor).unwrap_err();
        assert!(matches!(err, PipelineError::Identifier(IdentifierError::InvalidAbbreviation(_))));
        assert_nothing_written(&fx);
    }

    #[test]
    fn unknown_branch_rolls_back() {
        let fx = Fixture::new();
        let mut form = fx.proposal_form("ABCDE1234F");
        form.branch_id = "ZZZ0000099".into();
        let err = create_proposal(&fx.conn, &form, &fx.actor()).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "branch", .. }));
        assert_nothing_written(&fx);
    }

    #[test]
    fn other_company_branch_or_product_is_refused() {
        let fx = Fixture::new();
        let outsider = fx.outsider();

        // Form built on the fixture company's branch and product
        let err = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &outsider).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "branch", .. }));
        assert_eq!(err.to_string(), format!("Invalid branch: Branch {} does not belong to this company", fx.branch_id));

        let own_branch = branch::create_branch(&fx.conn, outsider.company_id, "OTF", "Nashik").unwrap();
        let mut form = fx.proposal_form("ABCDE1234F");
        form.branch_id = own_branch;
        let err = create_proposal(&fx.conn, &form, &outsider).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "product", .. }));

        assert_nothing_written(&fx);

        // Without a product the outsider's own branch is enough
        form.product_id = None;
        let created = create_proposal(&fx.conn, &form, &outsider).unwrap();
        assert!(created.prop_no.starts_with("OTF"));
    }

    #[test]
    fn failure_at_any_step_rolls_back_every_step() {
        let failure_points = [
            ("INSERT", "leads"),
            ("INSERT", "applications"),
            ("INSERT", "process_state"),
            ("INSERT", "client_id_seq"),
            ("INSERT", "client"),
            ("INSERT", "proposals"),
            ("UPDATE", "applications"),
            ("UPDATE", "process_state"),
            ("UPDATE", "client"),
            ("INSERT", "client_address"),
        ];

        for (event, table) in failure_points {
            let fx = Fixture::new();
            fail_on(&fx.conn, event, table);

            let result = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor());
            assert!(result.is_err(), "{event} on {table} should fail the pipeline");
            assert_nothing_written(&fx);
            assert!(fx.conn.is_autocommit(), "transaction left open after {event} on {table}");
        }
    }

    #[test]
    fn rollback_does_not_consume_identifiers() {
        let fx = Fixture::new();
        fail_on(&fx.conn, "INSERT", "client_address");
        assert!(create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor()).is_err());

        fx.conn.execute_batch("DROP TRIGGER fail_INSERT_client_address").unwrap();
        let created = create_proposal(&fx.conn, &fx.proposal_form("ABCDE1234F"), &fx.actor()).unwrap();
        assert_eq!(created.lead_id, 1);
        assert_eq!(created.client_id, 1);
        assert_eq!(created.client_tag, ClientTag::New);
        assert_eq!(created.prop_no, "ABC0000000000001");
    }

    #[test]
    fn joins_caller_transaction() {
        let fx = Fixture::new();
        let actor = fx.actor();
        let form = fx.proposal_form("ABCDE1234F");

        let result = in_transaction(&fx.conn, |tx| -> Result<(), PipelineError> {
            create_proposal(tx, &form, &actor)?;
            Err(PipelineError::invalid("caller", "abandoned after the proposal"))
        });
        assert!(result.is_err());
        assert_nothing_written(&fx);
    }

    #[test]
    fn create_lead_initializes_process() {
        let fx = Fixture::new();
        let new_lead = NewLead {
            branch_id: fx.branch_id.clone(),
            product_id: None,
            name: "Kiran Shah".into(),
            mobile: "9123456780".into(),
            pan: "KLMNO4321P".into(),
            amount: 50_000.0,
        };
        let created = create_lead(&fx.conn, &new_lead, &fx.actor()).unwrap();
        let log = process::get_process_log(&fx.conn, &ApplicationKeys::app(created.app_id)).unwrap();
        assert_eq!(log.keys.lead_id, Some(created.lead_id));
        assert_eq!(log.current_process, CurrentStage::Pending(Stage::ProposalProcess));
    }
}
