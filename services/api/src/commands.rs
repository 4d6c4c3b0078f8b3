use crate::infra::{
    parse_bedrooms, parse_document, parse_property_type, parse_province, Workflows,
};
use chrono::Utc;
use clap::Args;
use mapleleaf_rentals::config::AppConfig;
use mapleleaf_rentals::error::AppError;
use mapleleaf_rentals::telemetry;
use mapleleaf_rentals::webhook::{DeliveryOutcome, DeliveryPolicy, WebhookTransport};
use mapleleaf_rentals::workflows::chat::{
    ChatRole, ChatSession, LeadInfo, LeadNotifier, LeadTransition,
};
use mapleleaf_rentals::workflows::inquiry::{
    render_payload, Bedrooms, DocumentKind, InquiryField, InquiryWizard, Province,
    RentalPropertyType, ResultView, StepAction,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn parse_policy(raw: &str) -> Result<DeliveryPolicy, String> {
    DeliveryPolicy::parse(raw).ok_or_else(|| format!("unknown delivery policy '{raw}'"))
}

fn parse_requested(raw: &str) -> Result<DocumentKind, String> {
    DocumentKind::lookup(raw).ok_or_else(|| format!("unknown document '{raw}'"))
}

#[derive(Args, Debug)]
pub(crate) struct InquiryArgs {
    /// Province or territory (name or two letter code)
    #[arg(long, value_parser = parse_province)]
    pub(crate) province: Option<Province>,
    /// City or neighbourhood
    #[arg(long, default_value = "")]
    pub(crate) city: String,
    /// Apartment, Condo, Basement Suite, Detached House, Townhouse or Shared Room
    #[arg(long, value_parser = parse_property_type)]
    pub(crate) property_type: Option<RentalPropertyType>,
    /// Monthly budget in CAD; snapped to the 500-8000 slider in steps of 100
    #[arg(long, default_value_t = 2500, allow_negative_numbers = true)]
    pub(crate) budget: i64,
    /// Studio, 1, 2 or 3+
    #[arg(long, value_parser = parse_bedrooms, default_value = "1")]
    pub(crate) bedrooms: Bedrooms,
    /// Require a pet-friendly rental
    #[arg(long)]
    pub(crate) pets: bool,
    /// Target move-in date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub(crate) move_in: String,
    #[arg(long, default_value = "")]
    pub(crate) email: String,
    #[arg(long, default_value = "")]
    pub(crate) phone: String,
    #[arg(long, default_value = "")]
    pub(crate) credit_score: String,
    /// Document the renter intends to provide (repeatable)
    #[arg(long = "request", value_parser = parse_requested)]
    pub(crate) requested: Vec<DocumentKind>,
    /// Attach a document as KIND=PATH, e.g. credit-report=./equifax.pdf (repeatable)
    #[arg(long = "document", value_parser = parse_document)]
    pub(crate) documents: Vec<(DocumentKind, PathBuf)>,
    /// Override WEBHOOK_DELIVERY_POLICY (best-effort or confirmed)
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<DeliveryPolicy>,
    /// Print the webhook payload instead of sending it
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) async fn run_inquiry(args: InquiryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let workflows = Workflows::from_config(&config);
    let policy = args.policy.unwrap_or(config.webhooks.delivery_policy);
    let mut wizard = InquiryWizard::new(workflows.submissions.clone(), policy);

    println!("MapleLeaf rental inquiry ({} delivery)", policy.label());

    announce(&wizard);
    wizard.set_field(InquiryField::Province(args.province));
    wizard.set_field(InquiryField::City(args.city));
    wizard.next();

    announce(&wizard);
    wizard.set_field(InquiryField::PropertyType(args.property_type));
    wizard.set_field(InquiryField::Bedrooms(args.bedrooms));
    wizard.next();

    announce(&wizard);
    wizard.set_field(InquiryField::MonthlyBudget(args.budget));
    wizard.set_field(InquiryField::Pets(args.pets));
    println!(
        "  budget ${} / month, pets {}",
        wizard.state().monthly_budget.amount(),
        if args.pets { "required" } else { "not required" }
    );
    wizard.next();

    announce(&wizard);
    for kind in args.requested {
        if !wizard.state().documents.slot(kind).requested {
            wizard.toggle_requested_doc(kind);
        }
    }
    for (kind, path) in &args.documents {
        match wizard.attach_document(*kind, Some(path.as_path())).await {
            Ok(()) => println!("  attached {} from {}", kind.upload_label(), path.display()),
            Err(err) => println!("  could not attach {}: {}", kind.label(), err),
        }
    }
    wizard.next();

    announce(&wizard);
    wizard.set_field(InquiryField::MoveInDate(args.move_in));
    wizard.set_field(InquiryField::Email(args.email));
    wizard.set_field(InquiryField::Phone(args.phone));
    wizard.set_field(InquiryField::CreditScore(args.credit_score));

    if args.dry_run {
        match render_payload(wizard.state(), Utc::now())
            .and_then(|payload| serde_json::to_string_pretty(&payload))
        {
            Ok(json) => println!("{json}"),
            Err(err) => println!("  payload unavailable: {err}"),
        }
        return Ok(());
    }

    let view = wizard.submit().await?;
    println!("\n{}", view.headline());
    match view {
        ResultView::Submitted(receipt) => {
            println!("{}", receipt.message());
            if let DeliveryOutcome::Failed(reason) = &receipt.delivery {
                println!("  (webhook delivery failed: {reason})");
            }
        }
        ResultView::Failed { reason } => println!("{reason}"),
        ResultView::Editing => {}
    }
    Ok(())
}

fn announce<T>(wizard: &InquiryWizard<T>)
where
    T: WebhookTransport + ?Sized,
{
    let step = wizard.step();
    let action = match wizard.controls().last() {
        Some(StepAction::Submit) => "submit",
        _ => "next",
    };
    println!("Step {}/5: {} [{}]", step.index() + 1, step.title(), action);
}

#[derive(Args, Debug)]
pub(crate) struct ChatArgs {
    /// Email for the lead form
    #[arg(long, default_value = "")]
    pub(crate) email: String,
    /// Phone number for the lead form
    #[arg(long, default_value = "")]
    pub(crate) phone: String,
    /// Question for the rental assistant
    pub(crate) question: String,
}

/// Holds captured leads so the command can post them before exiting.
#[derive(Default)]
struct HeldLeads(Mutex<Vec<LeadInfo>>);

impl HeldLeads {
    fn take(&self) -> Vec<LeadInfo> {
        match self.0.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl LeadNotifier for HeldLeads {
    fn notify(&self, lead: &LeadInfo) {
        match self.0.lock() {
            Ok(mut guard) => guard.push(lead.clone()),
            Err(poisoned) => poisoned.into_inner().push(lead.clone()),
        }
    }
}

pub(crate) async fn run_chat(args: ChatArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let workflows = Workflows::from_config(&config);
    let held = Arc::new(HeldLeads::default());
    let mut session = ChatSession::new(workflows.chat_client.clone(), held.clone());

    if let LeadTransition::Unlocked(lead) = session.submit_lead(&args.email, &args.phone)? {
        println!("Lead captured for {} / {}", lead.email, lead.phone);
    }
    for lead in held.take() {
        let outcome = workflows.notifier.deliver(&lead).await;
        println!(
            "  lead webhook: {}",
            if outcome.is_delivered() { "delivered" } else { "not delivered" }
        );
    }

    session.send(&args.question).await?;

    println!();
    for message in session.messages() {
        let speaker = match message.role {
            ChatRole::User => "you",
            ChatRole::Model => "assistant",
        };
        println!("[{}] {}: {}", message.timestamp.format("%H:%M"), speaker, message.text);
    }
    Ok(())
}
