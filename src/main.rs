use chrono::{Days, Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use aerobill::config::{
    config_dir, init_config_dir, ledger_path, load_catalog, load_config, load_customers,
    resolve_output_dir, Config,
};
use aerobill::invoice::{parse_date, parse_decimal, parse_item_spec};
use aerobill::money::format_money;
use aerobill::render::{default_renderers, render_first_available};
use aerobill::{
    Billing, BillingError, BillingSettings, FileStore, Invoice, InvoiceDraft, InvoiceEdit,
    InvoiceFilter, InvoiceStatus, LineItemPatch, Result,
};

/// Invoices listed per page
const PAGE_SIZE: usize = 12;

#[derive(Parser)]
#[command(name = "aerobill")]
#[command(version, about = "Invoicing for airport services and car rental", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.aerobill)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// List configured customers
    Customers,

    /// List billable services
    Catalog,

    /// Show configuration and the next invoice number
    Status,

    /// Create a new invoice
    Create {
        /// Customer identifier from customers.toml
        #[arg(short, long)]
        customer: String,

        /// Line items as "service:qty" or "description:qty:unit_price" (can be repeated)
        #[arg(short, long, value_name = "SPEC")]
        item: Vec<String>,

        /// Issue date, YYYY-MM-DD (default: today)
        #[arg(long)]
        issued: Option<String>,

        /// Due date, YYYY-MM-DD (default: issue date + due_days)
        #[arg(long)]
        due: Option<String>,

        /// Currency code (default from config.toml)
        #[arg(long)]
        currency: Option<String>,

        /// Tax rate in percent, e.g. 20.00 (default from config.toml)
        #[arg(long)]
        tax_rate: Option<String>,

        /// Free-text note printed on the invoice
        #[arg(long)]
        note: Option<String>,
    },

    /// List invoices, newest first
    List {
        /// Search invoice number, customer name or email
        #[arg(short, long)]
        query: Option<String>,

        /// Only invoices with this status (draft, sent, paid, void)
        #[arg(short, long)]
        status: Option<InvoiceStatus>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Show an invoice with its line items
    Show {
        /// Invoice number (e.g., INV-202503-0001) or id
        invoice: String,
    },

    /// Change an invoice's header fields; the number never changes
    Edit {
        /// Invoice number or id
        invoice: String,

        /// Tax rate in percent, e.g. 10.00
        #[arg(long)]
        tax_rate: Option<String>,

        #[arg(long)]
        currency: Option<String>,

        /// Issue date, YYYY-MM-DD
        #[arg(long)]
        issued: Option<String>,

        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Add a line item to an invoice
    AddItem {
        /// Invoice number or id
        invoice: String,

        /// "service:qty" or "description:qty:unit_price"
        item: String,
    },

    /// Change a line item
    EditItem {
        /// Invoice number or id
        invoice: String,

        /// 1-based line position as shown by 'show'
        line: usize,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        qty: Option<String>,

        #[arg(long)]
        unit_price: Option<String>,
    },

    /// Remove a line item
    RemoveItem {
        /// Invoice number or id
        invoice: String,

        /// 1-based line position as shown by 'show'
        line: usize,
    },

    /// Mark a draft invoice as sent
    Send { invoice: String },

    /// Mark a sent invoice as paid
    Pay {
        invoice: String,

        /// Payment date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Void a draft or sent invoice
    Void { invoice: String },

    /// Recompute cached totals (all invoices when none is given)
    Recalc { invoice: Option<String> },

    /// Delete an invoice and its line items
    Delete { invoice: String },

    /// Render an invoice document (PDF via Typst, plain text otherwise)
    Render {
        invoice: String,

        /// Custom output file path (default: output_dir/<number>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "aerobill=warn",
        1 => "aerobill=info",
        _ => "aerobill=debug",
    };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_directive.to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        command => dispatch(&Context::open(cfg_dir)?, command),
    }
}

fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Init => cmd_init(&ctx.cfg_dir),
        Commands::Customers => cmd_customers(ctx),
        Commands::Catalog => cmd_catalog(ctx),
        Commands::Status => cmd_status(ctx),
        Commands::Create {
            customer,
            item,
            issued,
            due,
            currency,
            tax_rate,
            note,
        } => cmd_create(
            ctx,
            CreateArgs {
                customer,
                items: item,
                issued,
                due,
                currency,
                tax_rate,
                note,
            },
        ),
        Commands::List {
            query,
            status,
            page,
        } => cmd_list(ctx, query, status, page),
        Commands::Show { invoice } => cmd_show(ctx, &invoice),
        Commands::Edit {
            invoice,
            tax_rate,
            currency,
            issued,
            due,
            note,
        } => cmd_edit(
            ctx,
            &invoice,
            EditArgs {
                tax_rate,
                currency,
                issued,
                due,
                note,
            },
        ),
        Commands::AddItem { invoice, item } => cmd_add_item(ctx, &invoice, &item),
        Commands::EditItem {
            invoice,
            line,
            description,
            qty,
            unit_price,
        } => cmd_edit_item(ctx, &invoice, line, description, qty, unit_price),
        Commands::RemoveItem { invoice, line } => cmd_remove_item(ctx, &invoice, line),
        Commands::Send { invoice } => cmd_transition(ctx, &invoice, InvoiceStatus::Sent, None),
        Commands::Pay { invoice, date } => {
            cmd_transition(ctx, &invoice, InvoiceStatus::Paid, date)
        }
        Commands::Void { invoice } => cmd_transition(ctx, &invoice, InvoiceStatus::Void, None),
        Commands::Recalc { invoice } => cmd_recalc(ctx, invoice.as_deref()),
        Commands::Delete { invoice } => cmd_delete(ctx, &invoice),
        Commands::Render { invoice, output } => cmd_render(ctx, &invoice, output),
    }
}

/// Everything a command needs once the config dir is known to exist
struct Context {
    cfg_dir: PathBuf,
    config: Config,
    billing: Billing<FileStore>,
}

impl Context {
    fn open(cfg_dir: PathBuf) -> Result<Self> {
        if !cfg_dir.exists() {
            return Err(BillingError::ConfigNotFound(cfg_dir));
        }

        let config = load_config(&cfg_dir)?;
        let settings = BillingSettings {
            numbering: config.invoice.numbering,
            max_attempts: config.invoice.max_attempts,
        };
        let billing = Billing::new(FileStore::open(ledger_path(&cfg_dir)), settings);

        Ok(Self {
            cfg_dir,
            config,
            billing,
        })
    }

    fn money(&self, invoice: &Invoice) -> String {
        format_money(invoice.amount, &invoice.currency)
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    init_config_dir(cfg_dir)?;

    println!("Initialized aerobill config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your customers:         $EDITOR {}/customers.toml",
        cfg_dir.display()
    );
    println!(
        "  3. Configure services:         $EDITOR {}/catalog.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then create your first invoice:");
    println!("  aerobill create --customer <customer-id> --item <service>:<qty>");

    Ok(())
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "UNIT")]
    unit: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "ISSUED")]
    issued: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "QTY")]
    qty: String,
    #[tabled(rename = "UNIT PRICE")]
    unit_price: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

/// List configured customers
fn cmd_customers(ctx: &Context) -> Result<()> {
    let customers = load_customers(&ctx.cfg_dir)?;

    if customers.is_empty() {
        println!("No customers configured.");
        println!("Add customers to: {}/customers.toml", ctx.cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = customers.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let rows: Vec<CustomerRow> = sorted
        .iter()
        .map(|(id, customer)| CustomerRow {
            id: id.to_string(),
            name: customer.name.clone(),
            email: customer.email.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

/// List billable services
fn cmd_catalog(ctx: &Context) -> Result<()> {
    let catalog = load_catalog(&ctx.cfg_dir)?;

    if catalog.is_empty() {
        println!("No services configured.");
        println!("Add services to: {}/catalog.toml", ctx.cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = catalog.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let rows: Vec<CatalogRow> = sorted
        .iter()
        .map(|(id, item)| CatalogRow {
            id: id.to_string(),
            description: item.description.clone(),
            price: format_money(item.unit_price, &ctx.config.invoice.currency),
            unit: format!("/{}", item.unit),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

/// Show configuration and the next invoice number
fn cmd_status(ctx: &Context) -> Result<()> {
    let customers = load_customers(&ctx.cfg_dir)?;
    let catalog = load_catalog(&ctx.cfg_dir)?;
    let invoices = ctx.billing.search(&InvoiceFilter::default())?;
    let next_number = ctx.billing.preview_number(Local::now().date_naive())?;

    println!("Invoice Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", ctx.cfg_dir.display());
    println!("Ledger:           {}", ctx.billing.store().path().display());
    println!("Company:          {}", ctx.config.company.name);
    println!("Customers:        {}", customers.len());
    println!("Services:         {}", catalog.len());
    println!("Invoices:         {}", invoices.len());
    println!("Next invoice:     {next_number}");

    if !invoices.is_empty() {
        println!();
        println!("Recent invoices:");
        for invoice in invoices.iter().take(5) {
            println!(
                "  {} - {} - {} - {}",
                invoice.number,
                invoice.customer,
                invoice.status,
                ctx.money(invoice)
            );
        }
    }

    Ok(())
}

struct CreateArgs {
    customer: String,
    items: Vec<String>,
    issued: Option<String>,
    due: Option<String>,
    currency: Option<String>,
    tax_rate: Option<String>,
    note: Option<String>,
}

/// Create a new invoice
fn cmd_create(ctx: &Context, args: CreateArgs) -> Result<()> {
    let customers = load_customers(&ctx.cfg_dir)?;
    let customer = customers
        .get(&args.customer)
        .ok_or_else(|| BillingError::CustomerNotFound(args.customer.clone()))?;

    let catalog = load_catalog(&ctx.cfg_dir)?;
    let items = args
        .items
        .iter()
        .map(|spec| parse_item_spec(spec, &catalog))
        .collect::<Result<Vec<_>>>()?;

    let settings = &ctx.config.invoice;
    let issued_at = match args.issued.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };
    let due_at = match args.due.as_deref() {
        Some(raw) => Some(parse_date(raw)?),
        None if settings.due_days > 0 => Some(
            issued_at
                .checked_add_days(Days::new(u64::from(settings.due_days)))
                .ok_or_else(|| {
                    BillingError::InvalidDate(format!(
                        "{issued_at} + {} days (due_days is out of range)",
                        settings.due_days
                    ))
                })?,
        ),
        None => None,
    };
    let tax_rate = match args.tax_rate.as_deref() {
        Some(raw) => parse_decimal("tax rate", raw)?,
        None => settings.tax_rate,
    };

    let draft = InvoiceDraft {
        customer: customer.name.clone(),
        customer_email: customer.email.clone(),
        currency: args.currency.unwrap_or_else(|| settings.currency.clone()),
        tax_rate,
        issued_at: Some(issued_at),
        due_at,
        notes: args.note.unwrap_or_default(),
    };

    let invoice = ctx.billing.create_invoice(draft, &items)?;

    println!("Created {}", invoice.number);
    println!("  Customer: {}", invoice.customer);
    println!("  Items:    {}", items.len());
    println!("  Total:    {}", ctx.money(&invoice));

    Ok(())
}

/// List invoices with search and pagination
fn cmd_list(
    ctx: &Context,
    query: Option<String>,
    status: Option<InvoiceStatus>,
    page: usize,
) -> Result<()> {
    let invoices = ctx.billing.search(&InvoiceFilter { query, status })?;

    if invoices.is_empty() {
        println!("No invoices found.");
        return Ok(());
    }

    let num_pages = invoices.len().div_ceil(PAGE_SIZE);
    let page = page.clamp(1, num_pages);

    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .map(|invoice| InvoiceRow {
            id: invoice.id,
            number: invoice.number.clone(),
            issued: invoice.issued_at.to_string(),
            customer: invoice.customer.clone(),
            status: invoice.status.to_string(),
            amount: ctx.money(invoice),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!(
        "Page {page} of {num_pages} ({} invoices)",
        invoices.len()
    );

    Ok(())
}

/// Show an invoice with its line items
fn cmd_show(ctx: &Context, reference: &str) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let document = ctx.billing.document(invoice.id, &ctx.config.company)?;
    let money = |value| format_money(value, &invoice.currency);

    println!("Invoice {}", invoice.number);
    println!("{}", "-".repeat(50));
    println!("Customer:   {}", invoice.customer);
    if let Some(email) = &invoice.customer_email {
        println!("Email:      {email}");
    }
    println!("Status:     {}", invoice.status);
    println!("Issued:     {}", invoice.issued_at);
    println!(
        "Due:        {}",
        invoice
            .due_at
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(paid_at) = invoice.paid_at {
        println!("Paid:       {paid_at}");
    }
    if !invoice.notes.is_empty() {
        println!("Note:       {}", invoice.notes);
    }
    println!();

    if document.items.is_empty() {
        println!("No line items.");
    } else {
        let rows: Vec<LineRow> = document
            .items
            .iter()
            .map(|line| LineRow {
                position: line.position,
                description: line.description.clone(),
                qty: format!("{:.2}", line.qty),
                unit_price: money(line.unit_price),
                total: money(line.line_total),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    println!();
    let tax_label = format!("Tax ({:.2}%):", document.tax_rate);
    println!("{:<18}{}", "Subtotal:", money(document.subtotal));
    println!("{:<18}{}", tax_label, money(document.tax_amount));
    println!("{:<18}{}", "Total:", money(document.total));

    Ok(())
}

struct EditArgs {
    tax_rate: Option<String>,
    currency: Option<String>,
    issued: Option<String>,
    due: Option<String>,
    note: Option<String>,
}

/// Change an invoice's header fields
fn cmd_edit(ctx: &Context, reference: &str, args: EditArgs) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;

    let edit = InvoiceEdit {
        tax_rate: args
            .tax_rate
            .as_deref()
            .map(|raw| parse_decimal("tax rate", raw))
            .transpose()?,
        currency: args.currency,
        issued_at: args.issued.as_deref().map(parse_date).transpose()?,
        due_at: args.due.as_deref().map(parse_date).transpose()?,
        notes: args.note,
        ..Default::default()
    };
    if edit.is_empty() {
        println!("Nothing to change. Use --tax-rate, --currency, --issued, --due or --note.");
        return Ok(());
    }

    let invoice = ctx.billing.update_invoice(invoice.id, edit)?;

    println!("Updated {}", invoice.number);
    println!("  Total: {}", ctx.money(&invoice));
    Ok(())
}

/// Add a line item to an invoice
fn cmd_add_item(ctx: &Context, reference: &str, spec: &str) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let catalog = load_catalog(&ctx.cfg_dir)?;
    let item = parse_item_spec(spec, &catalog)?;

    ctx.billing.add_item(invoice.id, &item)?;
    let invoice = ctx.billing.get(invoice.id)?;

    println!("Added '{}' to {}", item.description, invoice.number);
    println!("  Total: {}", ctx.money(&invoice));
    Ok(())
}

/// Change a line item
fn cmd_edit_item(
    ctx: &Context,
    reference: &str,
    line: usize,
    description: Option<String>,
    qty: Option<String>,
    unit_price: Option<String>,
) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let item = ctx.billing.item_at(invoice.id, line)?;

    let patch = LineItemPatch {
        description,
        qty: qty.as_deref().map(|raw| parse_decimal("quantity", raw)).transpose()?,
        unit_price: unit_price
            .as_deref()
            .map(|raw| parse_decimal("unit price", raw))
            .transpose()?,
    };
    if patch.is_empty() {
        println!("Nothing to change. Use --description, --qty or --unit-price.");
        return Ok(());
    }

    ctx.billing.update_item(item.id, &patch)?;
    let invoice = ctx.billing.get(invoice.id)?;

    println!("Updated line {line} of {}", invoice.number);
    println!("  Total: {}", ctx.money(&invoice));
    Ok(())
}

/// Remove a line item
fn cmd_remove_item(ctx: &Context, reference: &str, line: usize) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let item = ctx.billing.item_at(invoice.id, line)?;

    ctx.billing.remove_item(item.id)?;
    let invoice = ctx.billing.get(invoice.id)?;

    println!("Removed '{}' from {}", item.description, invoice.number);
    println!("  Total: {}", ctx.money(&invoice));
    Ok(())
}

/// Move an invoice to another status
fn cmd_transition(
    ctx: &Context,
    reference: &str,
    status: InvoiceStatus,
    date: Option<String>,
) -> Result<()> {
    let on: NaiveDate = match date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };

    let invoice = ctx.billing.find(reference)?;
    let invoice = ctx.billing.transition(invoice.id, status, on)?;

    println!("{} is now {}", invoice.number, invoice.status);
    Ok(())
}

/// Recompute cached totals
fn cmd_recalc(ctx: &Context, reference: Option<&str>) -> Result<()> {
    let invoices = match reference {
        Some(reference) => vec![ctx.billing.find(reference)?],
        None => ctx.billing.search(&InvoiceFilter::default())?,
    };

    for invoice in &invoices {
        if let Some(totals) = ctx.billing.recalculate(invoice.id)? {
            println!(
                "{}: {}",
                invoice.number,
                format_money(totals.total, &invoice.currency)
            );
        }
    }
    println!("Recalculated {} invoice(s)", invoices.len());
    Ok(())
}

/// Delete an invoice and its line items
fn cmd_delete(ctx: &Context, reference: &str) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let deleted = ctx.billing.delete_invoice(invoice.id)?;

    println!("Deleted {}", deleted.number);
    Ok(())
}

/// Render an invoice document
fn cmd_render(ctx: &Context, reference: &str, output: Option<PathBuf>) -> Result<()> {
    let invoice = ctx.billing.find(reference)?;
    let document = ctx.billing.document(invoice.id, &ctx.config.company)?;

    let rendition = render_first_available(&default_renderers(), &document)?;

    let path = match output {
        Some(path) => path,
        None => {
            let output_dir = resolve_output_dir(&ctx.config.pdf.output_dir, &ctx.cfg_dir);
            std::fs::create_dir_all(&output_dir)?;
            output_dir.join(format!("{}.{}", invoice.number, rendition.extension))
        }
    };
    std::fs::write(&path, &rendition.bytes)?;

    println!("Rendered {} ({})", invoice.number, rendition.renderer);
    println!("  Saved: {}", path.display());
    Ok(())
}
