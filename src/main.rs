// region:    --- Imports
use bidhouse_client::bidding::{bid_rows, highest_bid, parse_amount};
use bidhouse_client::format::{format_ends_in, render_credits};
use bidhouse_client::listings::{Listing, ListingIncludes, SortPreset};
use bidhouse_client::profile::ProfileIncludes;
use bidhouse_client::profile::wins::badge_text;
use bidhouse_client::{AuctionClient, ClientConfig};
use chrono::Utc;
use tracing::{error, info};

// endregion: --- Imports

const USAGE: &str = "usage: bidhouse <command>
  listings [search] [newest|oldest|endingSoon|endingLast|priceHigh|priceLow]
  listing <id>
  ending-soon
  watch
  watch-wins
  profile <name>
  login <email> <password>
  logout
  bid <listing-id> <amount>
  my-bids
  my-wins";

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = ClientConfig::from_env();
    let client = AuctionClient::from_config(config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    if let Err(e) = run(&client, &args).await {
        error!("{:<12} --> {}", "Main", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &AuctionClient, args: &[&str]) -> Result<(), CliError> {
    match args {
        ["listings", rest @ ..] => {
            let mut query = client.listing_query();
            if let Some(search) = rest.first() {
                query = query.search(*search);
            }
            if let Some(preset) = rest.get(1) {
                query = query.preset(SortPreset::parse(preset));
            }
            let page = client.listings().fetch_page(&query).await?;
            for listing in &page.items {
                print_summary(listing);
            }
            println!(
                "page {} of {}",
                page.current_page,
                page.page_count.map_or("?".to_string(), |c| c.to_string())
            );
        }
        ["listing", id] => {
            let listing = client.listings().fetch_listing(id, ListingIncludes::ALL).await?;
            print_detail(client, &listing);
        }
        ["ending-soon"] => {
            for listing in client.listings().ending_soon(4).await? {
                print_summary(&listing);
            }
        }
        ["watch"] => {
            let mut handle = client.watch_ending_soon();
            info!("{:<12} --> 마감 임박 상품 감시 시작", "Main");
            loop {
                tokio::select! {
                    update = handle.changed() => match update {
                        Some(listings) => {
                            println!("--- ending soon ---");
                            listings.iter().for_each(print_summary);
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        handle.cancel();
                        break;
                    }
                }
            }
        }
        ["watch-wins"] => {
            let mut watch = client.watch_wins();
            info!("{:<12} --> 새 낙찰 감시 시작", "Main");
            loop {
                tokio::select! {
                    update = watch.changed() => match update {
                        Some(update) => {
                            if let Some(notice) = update.notice {
                                println!("new win! [{}]", notice.badge);
                            }
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        watch.cancel();
                        break;
                    }
                }
            }
        }
        ["profile", name] => {
            let includes = ProfileIncludes {
                listings: true,
                wins: true,
            };
            let profile = client.profiles().fetch_profile(name, includes).await?;
            println!(
                "{}  {}  wins: {}",
                profile.name,
                render_credits(profile.credits.unwrap_or_default()),
                badge_text(profile.wins_count())
            );
            if let Some(bio) = &profile.bio {
                println!("  {bio}");
            }
            for listing in profile.latest_listings(3) {
                print_summary(listing);
            }
        }
        ["login", email, password] => {
            let user = client.auth().login(email, password).await?;
            client.gateway().ensure_api_key().await;
            println!("logged in as {}", user.name);
        }
        ["logout"] => {
            client.auth().logout();
            println!("logged out");
        }
        ["bid", id, amount] => {
            let amount = parse_amount(amount).map_err(bidhouse_client::ApiError::from)?;
            let listing = client.listings().fetch_listing(id, ListingIncludes::ALL).await?;
            let placed = client.bid_submission().submit(&listing, amount).await?;
            println!("Bid placed successfully. ({})", render_credits(placed.amount));
            if let Some(updated) = placed.listing {
                print_detail(client, &updated);
            }
        }
        ["my-bids"] => {
            for summary in client.profiles().my_bids().await? {
                let status = match (summary.ended, summary.is_win) {
                    (true, true) => "won",
                    (true, false) => "ended",
                    _ => "active",
                };
                println!(
                    "{:<40} my bid {:>14}  current {:>14}  {}",
                    summary.listing.title,
                    render_credits(summary.my_bid),
                    render_credits(highest_bid(&summary.listing)),
                    status
                );
            }
        }
        ["my-wins"] => {
            client.acknowledge_wins().await?;
            for listing in client.profiles().my_wins().await? {
                println!(
                    "{:<40} {}",
                    listing.title,
                    render_credits(highest_bid(&listing))
                );
            }
        }
        _ => return Err(CliError::Usage),
    }
    Ok(())
}

fn print_summary(listing: &Listing) {
    println!(
        "{:<26} {:<40} {:>14}  {}",
        listing.id,
        listing.title,
        render_credits(highest_bid(listing)),
        format_ends_in(listing.ends_at, Utc::now())
    );
}

fn print_detail(client: &AuctionClient, listing: &Listing) {
    print_summary(listing);
    if let Some(description) = &listing.description {
        println!("  {description}");
    }
    println!("  seller: {}", listing.seller_name().unwrap_or("Unknown"));
    if let Some(cover) = listing.cover() {
        println!("  image: {}", cover.url);
    }

    let viewer = client.session().user().map(|u| u.name);
    let rows = bid_rows(listing, viewer.as_deref());
    if rows.is_empty() {
        println!("  No bids yet.");
    }
    for row in rows {
        println!("  {} - {}", row.label, render_credits(row.amount));
    }
}

// endregion: --- Main

// region:    --- Errors
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("unknown command")]
    Usage,

    #[error(transparent)]
    Api(#[from] bidhouse_client::ApiError),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::Api(e) => e.user_message(),
            CliError::Usage => USAGE.to_string(),
        }
    }
}

// endregion: --- Errors
