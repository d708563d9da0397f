//! [`SqliteStore`] — the SQLite implementation of [`ReceiptStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use beleg_core::{
  receipt::{Booking, Receipt, StoredReceipt},
  store::{BookedPersist, ListQuery, ReceiptStore},
};

use crate::{
  Error, Result,
  encode::{
    RawBooking, RawStoredReceipt, encode_date, encode_decimal, encode_dt,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const STORED_RECEIPT_COLUMNS: &str = "
  r.receipt_id, r.vendor, r.invoice_date, r.total, r.vat, r.currency,
  r.status, r.raw_text, r.file_path, r.created_at, r.updated_at, r.created_by,
  b.booking_id, b.voucher_id, b.booked_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Beleg receipt store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn raw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStoredReceipt> {
  Ok(RawStoredReceipt {
    receipt_id:   row.get(0)?,
    vendor:       row.get(1)?,
    invoice_date: row.get(2)?,
    total:        row.get(3)?,
    vat:          row.get(4)?,
    currency:     row.get(5)?,
    status:       row.get(6)?,
    raw_text:     row.get(7)?,
    file_path:    row.get(8)?,
    created_at:   row.get(9)?,
    updated_at:   row.get(10)?,
    created_by:   row.get(11)?,
    booking_id:   row.get(12)?,
    voucher_id:   row.get(13)?,
    booked_at:    row.get(14)?,
  })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

/// Internal result of the booked-persist transaction, before decoding.
enum PersistRaw {
  Committed,
  Missing,
  AlreadyBooked(RawBooking),
}

// ─── ReceiptStore impl ───────────────────────────────────────────────────────

impl ReceiptStore for SqliteStore {
  type Error = Error;

  async fn create(&self, receipt: Receipt) -> Result<()> {
    let id_str         = encode_uuid(receipt.id);
    let invoice_str    = encode_date(receipt.invoice_date);
    let total_str      = encode_decimal(receipt.total);
    let vat_str        = encode_decimal(receipt.vat);
    let status_str     = encode_status(receipt.status).to_owned();
    let created_str    = encode_dt(receipt.created_at);
    let updated_str    = receipt.updated_at.map(encode_dt);
    let created_by_str = receipt.created_by.map(encode_uuid);
    let Receipt { vendor, currency, raw_text, file_path, .. } = receipt;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO receipts (
             receipt_id, vendor, invoice_date, total, vat, currency,
             status, raw_text, file_path, created_at, updated_at, created_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            vendor,
            invoice_str,
            total_str,
            vat_str,
            currency,
            status_str,
            raw_text,
            file_path,
            created_str,
            updated_str,
            created_by_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<StoredReceipt>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStoredReceipt> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {STORED_RECEIPT_COLUMNS}
                 FROM receipts r
                 LEFT JOIN bookings b ON b.receipt_id = r.receipt_id
                 WHERE r.receipt_id = ?1"
              ),
              rusqlite::params![id_str],
              raw_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStoredReceipt::into_stored).transpose()
  }

  async fn list(&self, query: ListQuery) -> Result<Vec<StoredReceipt>> {
    let status_str = query.status.map(encode_status).map(str::to_owned);
    let (limit, offset) = query.limit_offset();

    let raws: Vec<RawStoredReceipt> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(status) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {STORED_RECEIPT_COLUMNS}
             FROM receipts r
             LEFT JOIN bookings b ON b.receipt_id = r.receipt_id
             WHERE r.status = ?1
             ORDER BY r.created_at DESC
             LIMIT ?2 OFFSET ?3"
          ))?;
          stmt
            .query_map(rusqlite::params![status, limit, offset], raw_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {STORED_RECEIPT_COLUMNS}
             FROM receipts r
             LEFT JOIN bookings b ON b.receipt_id = r.receipt_id
             ORDER BY r.created_at DESC
             LIMIT ?1 OFFSET ?2"
          ))?;
          stmt
            .query_map(rusqlite::params![limit, offset], raw_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStoredReceipt::into_stored).collect()
  }

  async fn persist_booked(
    &self,
    receipt: Receipt,
    booking: Booking,
  ) -> Result<BookedPersist> {
    let receipt_id     = receipt.id;
    let receipt_id_str = encode_uuid(receipt_id);
    let invoice_str    = encode_date(receipt.invoice_date);
    let total_str      = encode_decimal(receipt.total);
    let vat_str        = encode_decimal(receipt.vat);
    let status_str     = encode_status(receipt.status).to_owned();
    let updated_str    = receipt.updated_at.map(encode_dt);
    let booking_id_str = encode_uuid(booking.id);
    let booked_at_str  = encode_dt(booking.booked_at);
    let voucher_id     = booking.voucher_id;
    let Receipt { vendor, currency, raw_text, .. } = receipt;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let updated = tx.execute(
          "UPDATE receipts
           SET vendor = ?2, invoice_date = ?3, total = ?4, vat = ?5,
               currency = ?6, status = ?7, raw_text = ?8, updated_at = ?9
           WHERE receipt_id = ?1",
          rusqlite::params![
            receipt_id_str,
            vendor,
            invoice_str,
            total_str,
            vat_str,
            currency,
            status_str,
            raw_text,
            updated_str,
          ],
        )?;
        if updated == 0 {
          return Ok(PersistRaw::Missing);
        }

        let inserted = tx.execute(
          "INSERT INTO bookings (booking_id, receipt_id, voucher_id, booked_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            booking_id_str,
            receipt_id_str,
            voucher_id,
            booked_at_str,
          ],
        );

        match inserted {
          Ok(_) => {
            tx.commit()?;
            Ok(PersistRaw::Committed)
          }
          Err(e) if is_unique_violation(&e) => {
            // A concurrent request booked this receipt first. Roll back our
            // update and hand back the winner's booking.
            drop(tx);
            let winner = conn.query_row(
              "SELECT booking_id, receipt_id, voucher_id, booked_at
               FROM bookings WHERE receipt_id = ?1",
              rusqlite::params![receipt_id_str],
              |row| {
                Ok(RawBooking {
                  booking_id: row.get(0)?,
                  receipt_id: row.get(1)?,
                  voucher_id: row.get(2)?,
                  booked_at:  row.get(3)?,
                })
              },
            )?;
            Ok(PersistRaw::AlreadyBooked(winner))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match raw {
      PersistRaw::Committed => Ok(BookedPersist::Committed),
      PersistRaw::Missing => Err(Error::ReceiptNotFound(receipt_id)),
      PersistRaw::AlreadyBooked(winner) => {
        Ok(BookedPersist::AlreadyBooked(winner.into_booking()?))
      }
    }
  }
}
