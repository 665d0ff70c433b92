use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};
use hotelier::client::api::ApiClient;
use hotelier::client::notifications::{AlertSink, ChannelEvent, NotificationChannel};
use hotelier::client::room::{RoomEntry, RoomEntryOutcome};
use hotelier::client::session::{SessionContext, SessionState};
use hotelier::client::token::FileTokenStore;
use hotelier::client::transport::WsTransport;
use hotelier::client::ClientError;
use hotelier::server::model::bill::{BillView, PaymentMethod};
use hotelier::server::model::order::{OrderItemRequest, OrderStatus};

#[derive(Parser, Debug)]
#[command(name = "hotelier")]
#[command(about = "client cli used by hotel staff to interact with the server", version, long_about = None
)]
struct Cli {
    #[arg(long, global = true, env = "HOTELIER_API", default_value = "http://localhost:8080")]
    api: String,
    #[arg(long, global = true, env = "HOTELIER_TOKEN_FILE", help = "Where the session token is kept.")]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// sign in as a staff member
    #[command(arg_required_else_help = true)]
    Login {
        email: String,
        #[arg(long, env = "HOTELIER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// show the signed in staff member
    Whoami,
    /// end the session
    Logout,
    /// guest stays
    #[command(arg_required_else_help = true)]
    Guest(GuestArgs),
    /// room service orders
    #[command(arg_required_else_help = true)]
    Order(OrderArgs),
    /// record a payment on a guest's bill
    #[command(arg_required_else_help = true)]
    Pay {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        guest_id: i64,
        #[arg(help = "Amount in cents.", value_parser = clap::value_parser!(i64).range(1..))]
        amount: i64,
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
        #[arg(long)]
        paid_by: String,
    },
    /// show a guest's bill
    #[command(arg_required_else_help = true)]
    Bill {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        guest_id: i64,
    },
    /// guest room page, as seen from a hotel's domain
    #[command(arg_required_else_help = true)]
    Room(RoomArgs),
    /// stream new guest tickets until interrupted
    Watch {
        #[arg(long, help = "Ring the terminal bell on each ticket.")]
        bell: bool,
    },
}

#[derive(Debug, Args)]
struct GuestArgs {
    #[command(subcommand)]
    command: GuestCmds,
}

#[derive(Debug, Subcommand)]
enum GuestCmds {
    #[command(arg_required_else_help = true)]
    Checkin {
        name: String,
        #[arg(long)]
        room: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Checkout {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        guest_id: i64,
    },
    List {
        #[arg(long, default_value_t = 1)]
        page: u8,
        #[arg(long, default_value_t = 20)]
        page_size: u8,
    },
}

#[derive(Debug, Args)]
struct OrderArgs {
    #[command(subcommand)]
    command: OrderCmds,
}

#[derive(Debug, Subcommand)]
enum OrderCmds {
    #[command(arg_required_else_help = true)]
    Place {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        guest_id: i64,
        #[arg(long = "item", help = "NAME:QUANTITY:UNIT_PRICE_CENTS", value_parser = parse_item, num_args = 1..)]
        items: Vec<ItemSpec>,
    },
    #[command(arg_required_else_help = true)]
    List {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        guest_id: i64,
    },
    #[command(arg_required_else_help = true)]
    Deliver {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        order_id: i64,
    },
}

#[derive(Debug, Args)]
struct RoomArgs {
    #[arg(long, help = "Hotel host, e.g. seaside.hotelier.example")]
    host: String,
    #[command(subcommand)]
    command: RoomCmds,
}

#[derive(Debug, Subcommand)]
enum RoomCmds {
    #[command(arg_required_else_help = true)]
    Enter { room: String },
    #[command(arg_required_else_help = true)]
    Ticket { room: String, message: String },
}

#[derive(Debug, Clone)]
struct ItemSpec {
    name: String,
    quantity: u32,
    unit_price: i64,
}

fn parse_item(s: &str) -> Result<ItemSpec, String> {
    let mut parts = s.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected NAME:QUANTITY:UNIT_PRICE_CENTS, got {s}"));
    };
    Ok(ItemSpec {
        name: name.to_string(),
        quantity: quantity.parse().map_err(|e| format!("bad quantity {quantity}, {e}"))?,
        unit_price: price.parse().map_err(|e| format!("bad price {price}, {e}"))?,
    })
}

struct Terminal {
    bell: bool,
}

impl AlertSink for Terminal {
    fn toast(&self, title: &str, body: &str) {
        println!("{title}: {body}");
    }

    fn play_sound(&self) {
        if self.bell {
            print!("\x07");
        }
    }
}

fn default_token_file() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".hotelier").join("token")
}

fn print_bill(bill: &BillView) {
    println!(
        "bill {} for guest {}: total={} paid={} balance={} status={}",
        bill.id, bill.guest_id, bill.total_amount, bill.paid_amount, bill.balance_amount, bill.status
    );
    for payment in &bill.payments {
        println!("  {} paid {} by {} at {}", payment.paid_by, payment.amount, payment.method, payment.paid_at);
    }
}

/// Restores the stored session and returns a client carrying its token.
async fn signed_in(session: &SessionContext, api: &ApiClient) -> Result<ApiClient, anyhow::Error> {
    match session.initialize().await {
        SessionState::Verified(_) => Ok(api.clone().with_token(session.token())),
        SessionState::Offline => bail!("server at {} is unreachable", api.base_url()),
        _ => bail!("not signed in, run `login` first"),
    }
}

fn explain(e: ClientError) -> anyhow::Error {
    match e {
        ClientError::Unexpected { reason, .. } => anyhow!(reason),
        e => anyhow!(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Cli::parse();

    let api = ApiClient::new(&args.api)?;
    let tokens = Arc::new(FileTokenStore::new(args.token_file.unwrap_or_else(default_token_file)));
    let session = SessionContext::new(Arc::new(api.clone()), tokens);

    match args.command {
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await.map_err(explain)?;
            println!("signed in as {} ({}) for hotel {}", user.name, user.role, user.hotel_id);
        }
        Commands::Whoami => match session.initialize().await {
            SessionState::Verified(user) => {
                println!("{} <{}>, {} of hotel {}", user.name, user.email, user.role, user.hotel_id)
            }
            SessionState::Offline => println!("server unreachable, session could not be checked"),
            _ => println!("not signed in"),
        },
        Commands::Logout => {
            session.logout().await;
            println!("signed out");
        }
        Commands::Guest(guest) => {
            let api = signed_in(&session, &api).await?;
            match guest.command {
                GuestCmds::Checkin { name, room, email, phone } => {
                    let guest = api
                        .check_in(&name, &room, email.as_deref(), phone.as_deref())
                        .await
                        .map_err(explain)?;
                    println!("checked in {} to room {}, guest id = {}", guest.name, guest.room_number, guest.id);
                }
                GuestCmds::Checkout { guest_id } => {
                    let guest = api.check_out(guest_id).await.map_err(explain)?;
                    println!("guest {} checked out of room {}", guest.id, guest.room_number);
                }
                GuestCmds::List { page, page_size } => {
                    for guest in api.guests(page, page_size).await.map_err(explain)? {
                        let state = if guest.checked_out { "checked out" } else { "staying" };
                        println!("{}\t{}\troom {}\t{}", guest.id, guest.name, guest.room_number, state);
                    }
                }
            }
        }
        Commands::Order(order) => {
            let api = signed_in(&session, &api).await?;
            match order.command {
                OrderCmds::Place { guest_id, items } => {
                    let items: Vec<OrderItemRequest> = items
                        .into_iter()
                        .map(|i| OrderItemRequest {
                            name: i.name,
                            quantity: i.quantity,
                            unit_price: i.unit_price,
                        })
                        .collect();
                    let res = api.place_order(guest_id, &items).await.map_err(explain)?;
                    println!("order {} placed for {}", res.order.id, res.order.total_amount);
                    print_bill(&res.bill);
                }
                OrderCmds::List { guest_id } => {
                    for order in api.orders(guest_id).await.map_err(explain)? {
                        println!("{}\t{}\t{}\t{} items", order.id, order.status, order.total_amount, order.items.len());
                    }
                }
                OrderCmds::Deliver { order_id } => {
                    let order = api.set_order_status(order_id, OrderStatus::Delivered).await.map_err(explain)?;
                    println!("order {} is now {}", order.id, order.status);
                }
            }
        }
        Commands::Pay { guest_id, amount, method, paid_by } => {
            let api = signed_in(&session, &api).await?;
            let bill = api.pay(guest_id, amount, method, &paid_by).await.map_err(explain)?;
            print_bill(&bill);
        }
        Commands::Bill { guest_id } => {
            let api = signed_in(&session, &api).await?;
            print_bill(&api.bill(guest_id).await.map_err(explain)?);
        }
        Commands::Room(room) => match room.command {
            RoomCmds::Enter { room: input } => match RoomEntry::default().submit(&input) {
                RoomEntryOutcome::Toast(message) => println!("{message}"),
                RoomEntryOutcome::Navigate(path) => {
                    let number = input.trim();
                    let info = api.room(&room.host, number).await.map_err(explain)?;
                    println!("{} at {}", path, info.hotel_name);
                    match info.guest_name {
                        Some(name) => println!("welcome, {name}"),
                        None => println!("no guest is staying in room {}", info.room_number),
                    }
                }
            },
            RoomCmds::Ticket { room: number, message } => {
                let ticket = api.create_ticket(&room.host, &number, &message).await.map_err(explain)?;
                println!("ticket {} sent to the front desk", ticket.id);
            }
        },
        Commands::Watch { bell } => {
            let api = signed_in(&session, &api).await?;
            let token = session.token().ok_or_else(|| anyhow!("session token disappeared"))?;
            let transport = WsTransport::new(api.notifications_url(&token));
            let mut subscription = NotificationChannel::open(transport, Terminal { bell });
            // running the command is the gesture that allows sound
            subscription.unlock_audio();
            let cancel = subscription.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });
            while let Some(event) = subscription.next_event().await {
                match event {
                    ChannelEvent::Connected => println!("watching for tickets, ctrl-c to stop"),
                    ChannelEvent::Error(reason) => eprintln!("connection error: {reason}"),
                    ChannelEvent::Disconnected(reason) => eprintln!("disconnected: {reason}, reconnecting"),
                    ChannelEvent::TicketCreated(_) => {}
                }
            }
            session.dispose();
        }
    };
    Ok(())
}
