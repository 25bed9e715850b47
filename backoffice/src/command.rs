use chrono::{DateTime, Utc};
use snafu::{OptionExt, ResultExt};
use std::io::Write;
use std::time::Duration;
use text_io::read;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::approval::{ApprovalForm, PendingOrderReview, RejectionForm};
use crate::config::{ApproveArgs, Config, ListArgs, ListKind, ProductTagArgs};
use crate::dashboard::{count_orgs, summarize_orders};
use crate::debounce::Debouncer;
use crate::error::{CancelledSnafu, ErrorInfo, NotFoundSnafu, PromptSnafu};
use crate::export::{ExportFormat, export_records};
use crate::flight::ViewScope;
use crate::listing::{
    ListFilter, ListQuery, ListState, Listable, SortSpec, apply_filter, run_query, sort_records,
};
use crate::services::ApiClient;
use crate::services::orders::{list_orders, list_org_orders, list_pending_orders};
use crate::services::orgs::{get_org, list_orgs, register_org, update_org_status};
use crate::services::products::{list_products, update_product};
use crate::session::AuthContext;
use crate::tags::{TagEdit, apply_edit};
use crate::{Error, Result};
use dto::order::{OrderDto, OrderStatus};
use dto::org::{NewOrgDto, OrgDto, OrgStatus};
use dto::role::Role;

/// Records fetched for one of the list views
#[derive(Debug, Clone)]
pub enum Records {
    Orgs(Vec<OrgDto>),
    Orders(Vec<OrderDto>),
}

impl Records {
    pub fn len(&self) -> usize {
        match self {
            Records::Orgs(orgs) => orgs.len(),
            Records::Orders(orders) => orders.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ListKind {
    pub fn name(&self) -> &'static str {
        match self {
            ListKind::Orgs => "organizations",
            ListKind::Orders => "orders",
            ListKind::Pending => "pending-orders",
        }
    }
}

/// Fetches a list, organization users only ever see their own orders
pub async fn fetch_records(
    client: &ApiClient,
    role: &Role,
    kind: ListKind,
    search: Option<&str>,
) -> Result<Records> {
    let records = match (kind, role) {
        (ListKind::Orgs, _) => Records::Orgs(list_orgs(client, search).await?),
        (ListKind::Orders, Role::Org) => Records::Orders(list_org_orders(client, search).await?),
        (ListKind::Orders, Role::Admin) => Records::Orders(list_orders(client, search).await?),
        (ListKind::Pending, _) => Records::Orders(list_pending_orders(client, search).await?),
    };
    Ok(records)
}

pub fn list_query<S>(args: &ListArgs, status: Option<S>, default_per_page: u32) -> ListQuery<S> {
    ListQuery {
        filter: ListFilter {
            status,
            date_from: args.from,
            date_to: args.to,
            min_price: args.min_price,
            max_price: args.max_price,
            search: args.search.clone(),
        },
        sort: args.sort.map(|key| SortSpec::new(key, args.direction)),
        page: args.page,
        per_page: args.per_page.unwrap_or(default_per_page),
    }
}

fn org_status(args: &ListArgs) -> Result<Option<OrgStatus>> {
    args.status
        .as_deref()
        .map(OrgStatus::try_from)
        .transpose()
        .map_err(|e| Error::from(e.to_string()))
}

fn order_status(args: &ListArgs) -> Result<Option<OrderStatus>> {
    args.status
        .as_deref()
        .map(OrderStatus::try_from)
        .transpose()
        .map_err(|e| Error::from(e.to_string()))
}

/// Filtered and sorted records without pagination
fn filtered<T: Listable + Clone>(records: &[T], query: &ListQuery<T::Status>) -> Vec<T> {
    let mut items = apply_filter(records, &query.filter);
    if let Some(sort) = &query.sort {
        sort_records(&mut items, sort);
    }
    items
}

fn fmt_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

fn fmt_amount(amount: Option<f64>) -> String {
    match amount {
        Some(a) => format!("{:.2}", a),
        None => "-".to_string(),
    }
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(headers.to_vec());
    for row in rows.iter() {
        out.push('\n');
        out.push_str(&line(row.iter().map(|c| c.as_str()).collect()));
    }
    out
}

fn render_state<T>(state: &ListState<T>, headers: &[&str], row: impl Fn(&T) -> Vec<String>) -> String {
    match state {
        ListState::Loading => "Loading...".to_string(),
        ListState::Empty => "No records found.".to_string(),
        ListState::Failed(info) => info.to_string(),
        ListState::Loaded(page) => {
            let rows: Vec<Vec<String>> = page.data.iter().map(row).collect();
            format!(
                "{}\n\nPage {} of {}, {} records",
                render_table(headers, &rows),
                page.meta.page,
                page.meta.total_pages,
                page.meta.total_records
            )
        }
    }
}

const ORG_HEADERS: [&str; 6] = ["ID", "NAME", "CITY", "GST", "STATUS", "CREATED"];

fn org_row(org: &OrgDto) -> Vec<String> {
    vec![
        org.id.clone(),
        opt(org.name.as_deref()),
        opt(org.address.city.as_deref()),
        opt(org.gst_number.as_deref()),
        org.status.to_string(),
        fmt_date(org.created_at),
    ]
}

const ORDER_HEADERS: [&str; 6] = ["ID", "DATE", "ORGANIZATION", "PRODUCT", "AMOUNT", "STATUS"];

fn order_row(order: &OrderDto) -> Vec<String> {
    vec![
        order.id.clone(),
        fmt_date(order.submitted_at),
        opt(order.org_name.as_deref().or(Some(order.org_id.as_str()))),
        opt(order.product_name.as_deref()),
        fmt_amount(order.amount),
        order.status.to_string(),
    ]
}

/// Runs the list query and renders the resulting page as a table
pub fn render_records(records: &Records, args: &ListArgs, default_per_page: u32) -> Result<String> {
    let text = match records {
        Records::Orgs(orgs) => {
            let query = list_query(args, org_status(args)?, default_per_page);
            let state = ListState::from_result(Ok(run_query(orgs, &query)));
            render_state(&state, &ORG_HEADERS, org_row)
        }
        Records::Orders(orders) => {
            let query = list_query(args, order_status(args)?, default_per_page);
            let state = ListState::from_result(Ok(run_query(orders, &query)));
            render_state(&state, &ORDER_HEADERS, order_row)
        }
    };
    Ok(text)
}

/// Scope closed on Ctrl+C, so pending fetches resolve to `Error::Cancelled`
pub fn interruptible_scope() -> ViewScope {
    let scope = ViewScope::new();
    let closer = scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });
    scope
}

async fn scoped<F, T>(scope: &ViewScope, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match scope.run(fut).await {
        Some(result) => result,
        None => CancelledSnafu.fail(),
    }
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = std::io::stdout().flush();
    let value: String = read!("{}\n");
    value.trim().to_string()
}

pub async fn run_login(auth: &mut AuthContext) -> Result<()> {
    let email = prompt("Email");
    let password = rpassword::prompt_password("Password: ").context(PromptSnafu {
        msg: "Failed to read password",
    })?;

    let user = auth.login(&email, password.trim()).await?;
    println!("Logged in as {} ({}).", user.email, user.role);
    Ok(())
}

pub fn run_logout(auth: &mut AuthContext) -> Result<()> {
    auth.logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn run_whoami(auth: &AuthContext) -> Result<()> {
    let user = auth.user()?;
    println!("{{ id = {}, name = {}, email = {}, role = {} }}", user.id, user.name, user.email, user.role);
    Ok(())
}

pub async fn run_list(config: &Config, auth: &AuthContext, kind: ListKind, args: &ListArgs) -> Result<()> {
    let user = auth.user()?;
    let scope = interruptible_scope();
    let records = scoped(&scope, fetch_records(auth.client(), &user.role, kind, None)).await?;
    println!("{}", render_records(&records, args, config.per_page)?);
    Ok(())
}

fn print_order(order: &OrderDto) {
    println!("Order:        {}", order.id);
    println!("Organization: {}", opt(order.org_name.as_deref().or(Some(order.org_id.as_str()))));
    println!("Product:      {}", opt(order.product_name.as_deref()));
    println!("Brand:        {}", opt(order.brand.as_deref()));
    println!("Type:         {}", opt(order.product_type.as_deref()));
    println!("Batch size:   {}", opt(order.batch_size.as_deref()));
    println!("Unit type:    {}", opt(order.unit_type.as_deref()));
    println!("Amount:       {}", fmt_amount(order.amount));
    println!("Submitted:    {}", fmt_date(order.submitted_at));
    println!("Status:       {}", order.status);

    for item in order.items.iter() {
        println!(
            "  - {} x {} @ {}",
            item.quantity,
            item.product_name,
            fmt_amount(item.unit_price)
        );
    }
    if let Some(f) = &order.fulfillment {
        let sizes: Vec<String> = f.batch_sizes.iter().map(|s| s.to_string()).collect();
        println!("Batch sizes:  {}", sizes.join(", "));
        println!("MRP:          {:.2}", f.mrp);
        println!("Size code:    {}", f.size_code);
        println!("Delivery by:  {}", f.expected_delivery_date);
    }
    if let Some(reason) = &order.rejection_reason {
        println!("Rejected:     {}", reason);
    }
}

pub async fn run_order(auth: &AuthContext, id: &str) -> Result<()> {
    auth.user()?;
    let review = PendingOrderReview::load(auth.client(), id).await?;
    print_order(&review.order());
    Ok(())
}

pub async fn run_approve(auth: &AuthContext, args: &ApproveArgs) -> Result<()> {
    auth.user()?;
    let review = PendingOrderReview::load(auth.client(), &args.id).await?;
    let form = ApprovalForm {
        batch_sizes: args.batch_sizes.clone(),
        mrp: args.mrp.clone(),
        size_code: args.size_code.clone(),
        expected_delivery_date: args.delivery.clone(),
    };

    let order = review.approve(auth.client(), &form).await?;
    println!("Order approved.");
    print_order(&order);
    Ok(())
}

pub async fn run_reject(auth: &AuthContext, id: &str, reason: &str) -> Result<()> {
    auth.user()?;
    let review = PendingOrderReview::load(auth.client(), id).await?;
    let form = RejectionForm {
        reason: reason.to_string(),
    };

    let order = review.reject(auth.client(), &form).await?;
    println!("Order rejected.");
    print_order(&order);
    Ok(())
}

pub async fn run_org(auth: &AuthContext, id: &str) -> Result<()> {
    auth.user()?;
    let org = get_org(auth.client(), id).await?;
    println!("{}", render_table(&ORG_HEADERS, &[org_row(&org)]));
    println!("Email: {}", opt(org.email.as_deref()));
    println!("Phone: {}", opt(org.phone.as_deref()));
    println!("Drug license: {}", opt(org.drug_license_number.as_deref()));
    Ok(())
}

pub async fn run_register_org(auth: &AuthContext) -> Result<()> {
    auth.user()?;
    let data = NewOrgDto {
        name: prompt("Organization name"),
        address_line1: prompt("Address"),
        city: prompt("City"),
        state: prompt("State"),
        postal_code: prompt("Postal code"),
        gst_number: prompt("GST number"),
        drug_license_number: prompt("Drug license number"),
        email: prompt("Email"),
        phone: prompt("Phone"),
    };

    let org = register_org(auth.client(), &data).await?;
    println!("Registered organization {} ({}).", org.id, org.status);
    Ok(())
}

pub async fn run_org_status(auth: &AuthContext, id: &str, status: &str) -> Result<()> {
    auth.user()?;
    let status = OrgStatus::try_from(status).map_err(|e| Error::from(e.to_string()))?;
    let org = update_org_status(auth.client(), id, status).await?;
    println!("Organization {} is now {}.", org.id, org.status);
    Ok(())
}

pub async fn run_products(auth: &AuthContext) -> Result<()> {
    auth.user()?;
    let products = list_products(auth.client()).await?;
    if products.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                opt(p.product_type.as_deref()),
                p.unit_types.join(", "),
                p.batch_sizes.join(", "),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(&["ID", "NAME", "TYPE", "UNIT TYPES", "BATCH SIZES"], &rows)
    );
    Ok(())
}

pub async fn run_product_tags(auth: &AuthContext, args: &ProductTagArgs) -> Result<()> {
    auth.user()?;
    let products = list_products(auth.client()).await?;
    let mut product = products
        .into_iter()
        .find(|p| p.id == args.id)
        .context(NotFoundSnafu {
            msg: format!("Requested product {} not found.", args.id),
        })?;

    let edit = TagEdit::from(args);
    if !apply_edit(&mut product, &edit) {
        println!("Nothing to update.");
        return Ok(());
    }

    let product = update_product(auth.client(), &product).await?;
    println!("Unit types:  {}", product.unit_types.join(", "));
    println!("Batch sizes: {}", product.batch_sizes.join(", "));
    Ok(())
}

pub async fn run_dashboard(auth: &AuthContext) -> Result<()> {
    let user = auth.user()?;
    let scope = interruptible_scope();

    let records = scoped(
        &scope,
        fetch_records(auth.client(), &user.role, ListKind::Orders, None),
    )
    .await?;
    let Records::Orders(orders) = records else {
        return Ok(());
    };

    let summary = summarize_orders(&orders, 5);
    println!("Orders: {}", summary.total_orders);
    for (status, count) in summary.by_status.iter() {
        println!("  {:<12}{}", status.to_string(), count);
    }
    println!("Total amount:   {:.2}", summary.total_amount);
    println!("Pending amount: {:.2}", summary.pending_amount);

    if user.role == Role::Admin {
        let orgs = scoped(&scope, list_orgs(auth.client(), None)).await?;
        println!("Organizations: {}", orgs.len());
        for (status, count) in count_orgs(&orgs).iter() {
            println!("  {:<12}{}", status.to_string(), count);
        }
    }

    if !summary.recent.is_empty() {
        println!();
        println!("Recent orders");
        let rows: Vec<Vec<String>> = summary.recent.iter().map(order_row).collect();
        println!("{}", render_table(&ORDER_HEADERS, &rows));
    }
    Ok(())
}

/// Reads search terms line by line, each line standing for one keystroke.
///
/// Lines are debounced so only the last term of a burst reaches the backend.
pub async fn run_search(config: &Config, auth: &AuthContext, kind: ListKind) -> Result<()> {
    let user = auth.user()?;
    let scope = interruptible_scope();

    println!("Searching {}, one term per line, Ctrl+D to finish.", kind.name());

    let input = BufReader::new(tokio::io::stdin());
    search_session(config, auth.client(), &user.role, kind, input, &scope).await?;
    Ok(())
}

/// Drives one search session over `input`, returns the terms whose results
/// were shown, in order
async fn search_session<R>(
    config: &Config,
    client: &ApiClient,
    role: &Role,
    kind: ListKind,
    input: R,
    scope: &ViewScope,
) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, String)>();

    let debouncer = {
        let client = client.clone();
        let role = role.clone();
        let scope = scope.clone();
        let per_page = config.per_page;

        Debouncer::new(config.search_debounce(), move |term: String| {
            let client = client.clone();
            let role = role.clone();
            let scope = scope.clone();
            let tx = tx.clone();

            async move {
                let search = if term.is_empty() { None } else { Some(term.clone()) };
                let args = ListArgs {
                    search: search.clone(),
                    page: 1,
                    ..ListArgs::default()
                };
                let fetch = fetch_records(&client, &role, kind, search.as_deref());

                // Closed scope, nobody is looking at the results anymore
                let Some(result) = scope.run(fetch).await else {
                    return;
                };
                let text = match result.and_then(|records| render_records(&records, &args, per_page)) {
                    Ok(text) => text,
                    Err(e) => ErrorInfo::from(&e).to_string(),
                };
                let _ = tx.send((term, text));
            }
        })
    };

    let mut shown: Vec<String> = Vec::new();
    // Latest term still waiting for its result
    let mut awaiting: Option<String> = None;
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = scope.run(lines.next_line()) => {
                let Some(line) = line else {
                    return CancelledSnafu.fail();
                };
                let line = line.context(PromptSnafu {
                    msg: "Failed to read search term",
                })?;
                match line {
                    Some(term) => {
                        let term = term.trim().to_string();
                        awaiting = Some(term.clone());
                        debouncer.push(term);
                    }
                    None => break,
                }
            }
            Some((term, text)) = rx.recv() => {
                print_search_result(&term, &text);
                if awaiting.as_deref() == Some(term.as_str()) {
                    awaiting = None;
                }
                shown.push(term);
            }
        }
    }

    // Input is done, wait for the final term unless its result is already out
    if let Some(last) = awaiting {
        let wait = async {
            while let Some((term, text)) = rx.recv().await {
                print_search_result(&term, &text);
                let done = term == last;
                shown.push(term);
                if done {
                    break;
                }
            }
        };
        let limit = config.search_debounce() + Duration::from_secs(30);
        match scope.run(tokio::time::timeout(limit, wait)).await {
            None => return CancelledSnafu.fail(),
            Some(Err(_)) => warn!("No results for \"{}\" after {:?}", last, limit),
            Some(Ok(())) => {}
        }
    }
    Ok(shown)
}

fn print_search_result(term: &str, text: &str) {
    println!("\n> {}\n{}", term, text);
}

pub async fn run_export(
    config: &Config,
    auth: &AuthContext,
    kind: ListKind,
    format: ExportFormat,
    args: &ListArgs,
) -> Result<()> {
    let user = auth.user()?;
    let scope = interruptible_scope();
    let records = scoped(&scope, fetch_records(auth.client(), &user.role, kind, None)).await?;

    let now = Utc::now();
    let file = match &records {
        Records::Orgs(orgs) => {
            let query = list_query(args, org_status(args)?, config.per_page);
            export_records(&filtered(orgs, &query), kind.name(), format, now)?
        }
        Records::Orders(orders) => {
            let query = list_query(args, order_status(args)?, config.per_page);
            export_records(&filtered(orders, &query), kind.name(), format, now)?
        }
    };

    let path = file.save(&config.export_dir)?;
    println!("Exported to {}", path.display());
    Ok(())
}
