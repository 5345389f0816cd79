// bin/seed_booking.rs
//
// One-shot setup of the booking collections for the Lam Dep salon app:
// creates the catalog collections with sample documents, upgrades the
// pre-existing ones, regenerates a week of booking slots and drops in a
// sample booking. Safe to re-run; existing collections are skipped.

use anyhow::Result;
use bson::{doc, DateTime as BsonDateTime, Document};
use chrono::{Datelike, Duration, Utc, Weekday};
use futures_util::TryStreamExt;
use mongodb::{options::ClientOptions, Client, Collection, Database};

const DB_NAME: &str = "lamdep";

#[tokio::main]
async fn main() -> Result<()> {
    println!("Starting booking structure seed...");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client_options = ClientOptions::parse(&database_url).await?;
    let client = Client::with_options(client_options)?;
    let db = client.database(DB_NAME);

    // Connection check up front; everything after this is best-effort.
    let existing = db.list_collection_names().await?;
    println!("Connected to {}, {} collections present", DB_NAME, existing.len());

    for (name, sample_docs) in seed_collections() {
        if existing.iter().any(|c| c == name) {
            println!("  collection {} already exists, skipping", name);
            continue;
        }
        if let Err(e) = create_collection(&db, name, sample_docs).await {
            eprintln!("  failed to create {}: {}", name, e);
        }
    }

    if let Err(e) = update_users(&db).await {
        eprintln!("failed to update users: {}", e);
    }
    if let Err(e) = update_stores(&db).await {
        eprintln!("failed to update stores: {}", e);
    }
    if let Err(e) = update_coupons(&db).await {
        eprintln!("failed to update coupons: {}", e);
    }
    if let Err(e) = generate_booking_slots(&db).await {
        eprintln!("failed to generate booking slots: {}", e);
    }
    if let Err(e) = create_sample_booking(&db).await {
        eprintln!("failed to create sample booking: {}", e);
    }

    println!("Seed complete!");
    Ok(())
}

async fn create_collection(db: &Database, name: &str, docs: Vec<Document>) -> Result<()> {
    if docs.is_empty() {
        db.create_collection(name).await?;
        println!("  created empty collection {}", name);
        return Ok(());
    }

    let count = docs.len();
    let collection: Collection<Document> = db.collection(name);
    collection.insert_many(docs).await?;
    println!("  created {} with {} documents", name, count);
    Ok(())
}

fn stamped(mut doc: Document) -> Document {
    let now = BsonDateTime::now();
    doc.insert("created_at", now);
    doc.insert("updated_at", now);
    doc
}

fn seed_collections() -> Vec<(&'static str, Vec<Document>)> {
    vec![
        ("services", service_docs()),
        ("store_working_hours", working_hour_docs()),
        ("store_technicians", technician_docs()),
        ("booking_slots", vec![]),
        ("appointments", vec![]),
        ("store_reviews", review_docs()),
        ("user_favorites", favorite_docs()),
        ("notifications", notification_docs()),
    ]
}

fn service_docs() -> Vec<Document> {
    vec![
        stamped(doc! {
            "_id": "basic_manicure",
            "store_id": "1",
            "name": "Basic Manicure",
            "description": "Hand care, cuticle trim and nail filing",
            "price": 80_000,
            "duration": 30, // minutes
            "category": "nails_care",
            "is_active": true,
            "image_url": "assets/images/services/manicure.png",
            "requires_nail_design": false,
            "position": 1,
        }),
        stamped(doc! {
            "_id": "gel_color",
            "store_id": "1",
            "name": "Gel Color Polish",
            "description": "Single-color gel polish",
            "price": 120_000,
            "duration": 60,
            "category": "nail_service",
            "is_active": true,
            "image_url": "assets/images/services/gel_color.png",
            "requires_nail_design": false,
            "position": 2,
        }),
        stamped(doc! {
            "_id": "nail_art_basic",
            "store_id": "1",
            "name": "Basic Nail Art",
            "description": "Simple hand-painted patterns",
            "price": 50_000,
            "duration": 20,
            "category": "additional_service",
            "is_active": true,
            "image_url": "assets/images/services/nail_art.png",
            "requires_nail_design": true,
            "position": 3,
        }),
        stamped(doc! {
            "_id": "crystal_addon",
            "store_id": "1",
            "name": "Crystal Gem Add-on",
            "description": "Crystal gems applied to finished nails",
            "price": 30_000,
            "duration": 15,
            "category": "additional_service",
            "is_active": true,
            "image_url": "assets/images/services/crystal.png",
            "requires_nail_design": true,
            "position": 4,
        }),
    ]
}

fn working_hour_docs() -> Vec<Document> {
    vec![
        stamped(doc! {
            "_id": "store1_monday",
            "store_id": "1",
            "day_of_week": 1,
            "is_open": true,
            "open_time": "08:30",
            "close_time": "20:00",
            "break_start": "12:00",
            "break_end": "13:00",
        }),
        stamped(doc! {
            "_id": "store1_tuesday",
            "store_id": "1",
            "day_of_week": 2,
            "is_open": true,
            "open_time": "08:30",
            "close_time": "20:00",
        }),
        stamped(doc! {
            "_id": "store1_sunday",
            "store_id": "1",
            "day_of_week": 0,
            "is_open": false,
            "open_time": "09:00",
            "close_time": "18:00",
        }),
    ]
}

fn technician_docs() -> Vec<Document> {
    vec![
        stamped(doc! {
            "_id": "tech1",
            "store_id": "1",
            "name": "Mai Nguyen",
            "avatar_url": "https://i.pravatar.cc/150?img=1",
            "specialty": ["nail_art", "gel_nails"],
            "experience": 3, // years
            "rating": 4.8,
            "is_available": true,
            "working_hours": ["09:00-12:00", "13:00-18:00"],
        }),
        stamped(doc! {
            "_id": "tech2",
            "store_id": "1",
            "name": "An Tran",
            "avatar_url": "https://i.pravatar.cc/150?img=2",
            "specialty": ["pedicure", "manicure"],
            "experience": 5,
            "rating": 4.9,
            "is_available": true,
            "working_hours": ["10:00-13:00", "14:00-19:00"],
        }),
    ]
}

fn review_docs() -> Vec<Document> {
    vec![stamped(doc! {
        "_id": "review1",
        "store_id": "1",
        "user_id": "demo_user_1",
        "appointment_id": "sample_booking_1",
        "rating": 5,
        "comment": "Great service, the technician was very thorough",
        "service_rating": 5,
        "technician_rating": 5,
        "cleanliness_rating": 4,
        "is_recommended": true,
        "helpful_count": 2,
    })]
}

fn favorite_docs() -> Vec<Document> {
    vec![stamped(doc! {
        "user_id": "demo_user_1",
        "nail_id": "nail1",
        "added_at": BsonDateTime::now(),
    })]
}

fn notification_docs() -> Vec<Document> {
    vec![stamped(doc! {
        "user_id": "demo_user_1",
        "title": "Booking confirmed",
        "message": "Your nail appointment on 2025-12-21 at 14:00 is confirmed",
        "type": "booking",
        "data": { "appointment_id": "sample_booking_1" },
        "is_read": false,
    })]
}

// Add the booking cart to user documents that predate it.
async fn update_users(db: &Database) -> Result<()> {
    let users: Collection<Document> = db.collection("users");

    let result = users
        .update_many(
            doc! { "booking_cart_items": { "$exists": false } },
            doc! {
                "$set": {
                    "booking_cart_items": [],
                    "booking_cart_updated": BsonDateTime::now(),
                }
            },
        )
        .await?;

    if result.modified_count > 0 {
        println!("updated {} users with booking_cart_items", result.modified_count);
    }
    Ok(())
}

// Stamp booking metadata onto the storefront document.
async fn update_stores(db: &Database) -> Result<()> {
    let stores: Collection<Document> = db.collection("stores");

    let Some(store) = stores.find_one(doc! {}).await? else {
        println!("no store document found, skipping store upgrade");
        return Ok(());
    };
    let Some(store_id) = store.get("_id").cloned() else {
        return Ok(());
    };

    stores
        .update_one(
            doc! { "_id": store_id },
            doc! {
                "$set": {
                    "average_rating": 4.5,
                    "total_reviews": 0,
                    "services_count": 0,
                    "technicians_count": 0,
                    "is_booking_enabled": true,
                    "booking_notice": "Please book at least 2 hours in advance",
                    "updated_at": BsonDateTime::now(),
                }
            },
        )
        .await?;

    println!("updated store with booking fields");
    Ok(())
}

// Backfill the coupon fields the booking flow reads.
async fn update_coupons(db: &Database) -> Result<()> {
    let coupons: Collection<Document> = db.collection("coupons");

    let mut touched = 0;

    touched += coupons
        .update_many(
            doc! { "applicable_service_categories": { "$exists": false } },
            doc! { "$set": { "applicable_service_categories": ["all"] } },
        )
        .await?
        .modified_count;

    touched += coupons
        .update_many(
            doc! { "max_discount_amount": { "$exists": false } },
            doc! { "$set": { "max_discount_amount": 500_000 } },
        )
        .await?
        .modified_count;

    touched += coupons
        .update_many(
            doc! { "is_first_booking_only": { "$exists": false } },
            doc! { "$set": { "is_first_booking_only": false } },
        )
        .await?
        .modified_count;

    touched += coupons
        .update_many(
            doc! { "customer_segment": { "$exists": false } },
            doc! { "$set": { "customer_segment": "all" } },
        )
        .await?
        .modified_count;

    if touched > 0 {
        println!("backfilled coupon fields ({} updates)", touched);
    }
    Ok(())
}

// Regenerate hourly slots for the next 7 days, 09:00-19:00, capacity 3.
// Weekend slots carry a 1.2 price modifier.
async fn generate_booking_slots(db: &Database) -> Result<()> {
    let stores: Collection<Document> = db.collection("stores");
    let Some(store) = stores.find_one(doc! {}).await? else {
        println!("no store found, skipping booking slots");
        return Ok(());
    };
    let store_id = store
        .get_str("_id")
        .map(str::to_string)
        .unwrap_or_else(|_| "1".to_string());

    let slots: Collection<Document> = db.collection("booking_slots");

    // Drop whatever a previous run left behind for this store.
    let old = slots.find(doc! { "store_id": &store_id }).await?;
    let old_docs: Vec<Document> = old.try_collect().await?;
    if !old_docs.is_empty() {
        slots.delete_many(doc! { "store_id": &store_id }).await?;
        println!("removed {} stale slots", old_docs.len());
    }

    let today = Utc::now().date_naive();
    let mut docs = Vec::new();

    for day_offset in 0..7 {
        let day = today + Duration::days(day_offset);
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        let midnight = day.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();

        for hour in 9..19 {
            let start = format!("{:02}:00", hour);
            let end = format!("{:02}:00", hour + 1);
            let slot_id = format!("slot_{}_{}_{}", store_id, day, start);

            docs.push(doc! {
                "_id": slot_id,
                "store_id": &store_id,
                "date": BsonDateTime::from_chrono(midnight),
                "time_slot": format!("{}-{}", start, end),
                "duration": 60,
                "status": "available",
                "max_customers": 3,
                "current_bookings": 0,
                "price_modifier": if weekend { 1.2 } else { 1.0 },
                "created_at": BsonDateTime::now(),
                "updated_at": BsonDateTime::now(),
            });
        }
    }

    let count = docs.len();
    slots.insert_many(docs).await?;
    println!("created {} booking slots for store {}", count, store_id);
    Ok(())
}

async fn create_sample_booking(db: &Database) -> Result<()> {
    let bookings: Collection<Document> = db.collection("bookings");

    let booking = doc! {
        "_id": "sample_booking_1",
        "user_id": "demo_user_1",
        "store_id": "1",
        "booking_date": BsonDateTime::from_chrono(
            chrono::DateTime::parse_from_rfc3339("2025-12-22T14:00:00Z")
                .expect("static timestamp parses")
                .with_timezone(&Utc),
        ),
        "time_slot": "14:00-15:00",
        "duration": 90,
        "status": "confirmed",
        "nail_designs": [
            {
                "nail_id": "nail1",
                "nail_name": "Milky White Pearl",
                "nail_image": "assets/images/nail1.png",
                "price": 180_000,
                "notes": "Long nails please",
            }
        ],
        "additional_services": [
            {
                "service_id": "nail_art_basic",
                "service_name": "Basic Nail Art",
                "price": 50_000,
                "quantity": 1,
            },
            {
                "service_id": "crystal_addon",
                "service_name": "Crystal Gem Add-on",
                "price": 30_000,
                "quantity": 2,
            }
        ],
        "total_price": 260_000,
        "discount_amount": 0,
        "final_price": 260_000,
        "customer_name": "Trang Nguyen",
        "customer_phone": "0344656444",
        "customer_notes": "",
        "payment_status": "paid",
        "payment_method": "cash",
        "created_at": BsonDateTime::now(),
        "updated_at": BsonDateTime::now(),
        "confirmed_at": BsonDateTime::now(),
    };

    bookings
        .replace_one(doc! { "_id": "sample_booking_1" }, booking)
        .upsert(true)
        .await?;

    println!("created sample booking");
    Ok(())
}
