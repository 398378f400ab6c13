//! Worksheet, record and record item models.
//!
//! A [`Worksheet`] is one worker's production sheet for one date. It owns one
//! [`WorksheetRecord`] per slot of its shift schedule, and every record owns
//! the [`WorksheetRecordItem`] entries the worker declared for that hour.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::{HourSlot, ShiftSchedule, ShiftType, schedule_for};

/// Lifecycle of a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorksheetStatus {
    /// Open for output reporting.
    Active,
    /// Closed by a leader or admin.
    Completed,
    /// Past the retention window. Only admin removal is allowed.
    Archived,
}

/// Lifecycle of one hour record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// No output reported yet.
    Pending,
    /// Output has been written at least once.
    Completed,
}

/// One product/process entry a worker declared within an hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRecordItem {
    /// Unique identifier of the item.
    pub id: Uuid,
    /// The record this item belongs to.
    pub record_id: Uuid,
    /// 1-based position within the record, in insertion order.
    pub entry_index: u32,
    /// The product worked on.
    pub product_id: String,
    /// The process performed.
    pub process_id: String,
    /// This entry's share of the hour's planned output.
    pub planned_output: u32,
    /// Units actually produced.
    pub actual_output: u32,
    /// Free text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One submitted production entry, before it becomes a record item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputEntry {
    /// The product worked on.
    pub product_id: String,
    /// The process performed.
    pub process_id: String,
    /// Planned share. Falls back to the worksheet's hourly target when absent.
    #[serde(default)]
    pub planned_output: Option<u32>,
    /// Units actually produced.
    pub actual_output: u32,
    /// Free text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// The output of one worksheet hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRecord {
    /// Unique identifier of the record.
    pub id: Uuid,
    /// The schedule slot this record covers.
    pub work_hour: u32,
    /// Absolute start of the slot.
    pub start_time: DateTime<Utc>,
    /// Absolute end of the slot.
    pub end_time: DateTime<Utc>,
    /// Sum of item planned output; 0 on legacy rows falls back to the worksheet target.
    pub planned_output: u32,
    /// Cached sum of item actual output.
    pub actual_output: u32,
    /// Whether output was reported.
    pub status: RecordStatus,
    /// The last actor that wrote output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by_id: Option<String>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
    /// Store-managed optimistic version.
    pub version: u64,
    /// The entries of this hour, ordered by entry index.
    #[serde(default)]
    pub items: Vec<WorksheetRecordItem>,
}

impl WorksheetRecord {
    /// Sum of the items' actual output.
    pub fn items_actual(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.actual_output)).sum()
    }

    /// Sum of the items' planned output.
    pub fn items_planned(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.planned_output)).sum()
    }

    /// Returns true if any item recorded output.
    pub fn has_output(&self) -> bool {
        self.actual_output > 0 || self.items.iter().any(|item| item.actual_output > 0)
    }

    /// Replaces every item with the given entries and recomputes totals.
    ///
    /// Entries are numbered 1..N in the order given. Missing planned shares
    /// fall back to `fallback_planned`. The record is marked completed.
    pub fn replace_items(
        &mut self,
        entries: &[OutputEntry],
        fallback_planned: u32,
        actor_id: &str,
        now: DateTime<Utc>,
    ) {
        self.items = entries
            .iter()
            .zip(1..)
            .map(|(entry, entry_index)| WorksheetRecordItem {
                id: Uuid::new_v4(),
                record_id: self.id,
                entry_index,
                product_id: entry.product_id.clone(),
                process_id: entry.process_id.clone(),
                planned_output: entry.planned_output.unwrap_or(fallback_planned),
                actual_output: entry.actual_output,
                note: entry.note.clone(),
            })
            .collect();
        self.planned_output = saturate(self.items_planned());
        self.actual_output = saturate(self.items_actual());
        self.status = RecordStatus::Completed;
        self.updated_by_id = Some(actor_id.to_string());
        self.updated_at = now;
    }

    /// Replaces the items with copies of `source`, actual output zeroed.
    pub fn copy_items_from(&mut self, source: &[WorksheetRecordItem], actor_id: &str, now: DateTime<Utc>) {
        self.items = source
            .iter()
            .map(|item| WorksheetRecordItem {
                id: Uuid::new_v4(),
                record_id: self.id,
                actual_output: 0,
                ..item.clone()
            })
            .collect();
        self.planned_output = saturate(self.items_planned());
        self.actual_output = 0;
        self.updated_by_id = Some(actor_id.to_string());
        self.updated_at = now;
    }

    /// Sets the hour's planned output.
    ///
    /// Item shares are rebalanced proportionally so they sum to `planned`;
    /// the integer remainder goes to the first entries. Without items only
    /// the record-level value changes.
    pub fn set_planned(&mut self, planned: u32, actor_id: &str, now: DateTime<Utc>) {
        if !self.items.is_empty() {
            let shares = rebalance(
                &self.items.iter().map(|item| item.planned_output).collect::<Vec<_>>(),
                planned,
            );
            for (item, share) in self.items.iter_mut().zip(shares) {
                item.planned_output = share;
            }
        }
        self.planned_output = planned;
        self.updated_by_id = Some(actor_id.to_string());
        self.updated_at = now;
    }

    fn seeded(worksheet: &Worksheet, slot: &HourSlot, offset: FixedOffset, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        let (start_time, end_time) = slot.absolute_range(worksheet.date, offset);
        WorksheetRecord {
            id,
            work_hour: slot.hour,
            start_time,
            end_time,
            planned_output: worksheet.planned_output_per_hour,
            actual_output: 0,
            status: RecordStatus::Pending,
            updated_by_id: None,
            updated_at: now,
            version: 0,
            items: vec![worksheet.default_item(id)],
        }
    }

    fn has_default_entry_only(&self, product_id: &str, process_id: &str, planned: u32) -> bool {
        self.status == RecordStatus::Pending
            && matches!(self.items.as_slice(), [item]
                if item.product_id == product_id
                    && item.process_id == process_id
                    && item.planned_output == planned
                    && item.actual_output == 0)
    }
}

/// The fields needed to open a worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorksheet {
    /// The worker the sheet belongs to.
    pub worker_id: String,
    /// The worker's group.
    pub group_id: String,
    /// The office owning the group.
    pub office_id: String,
    /// The production date.
    pub date: NaiveDate,
    /// The shift the worker runs.
    pub shift_type: ShiftType,
    /// Default product for new hour records.
    pub product_id: String,
    /// Default process for new hour records.
    pub process_id: String,
    /// Hourly target.
    pub planned_output_per_hour: u32,
    /// The leader or admin creating the sheet.
    pub created_by_id: String,
}

/// One worker's production sheet for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    /// Unique identifier of the worksheet.
    pub id: Uuid,
    /// The owning worker.
    pub worker_id: String,
    /// The worker's group at creation.
    pub group_id: String,
    /// Denormalized owning office.
    pub office_id: String,
    /// The production date.
    pub date: NaiveDate,
    /// Default product for new hour records.
    pub product_id: String,
    /// Default process for new hour records.
    pub process_id: String,
    /// The current shift type.
    pub shift_type: ShiftType,
    /// Hourly target used for defaults and legacy fallbacks.
    pub planned_output_per_hour: u32,
    /// Lifecycle status.
    pub status: WorksheetStatus,
    /// The actor that created the sheet.
    pub created_by_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change to worksheet-level fields.
    pub updated_at: DateTime<Utc>,
    /// Store-managed optimistic version.
    pub version: u64,
    /// One record per schedule slot, ordered by work hour.
    pub records: Vec<WorksheetRecord>,
}

/// What a shift change did to a worksheet's records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeOutcome {
    /// The worksheet that was resized.
    pub worksheet_id: Uuid,
    /// Hours that were created.
    pub added_hours: Vec<u32>,
    /// Hours that were deleted together with their items.
    pub removed_hours: Vec<u32>,
    /// Deleted hours that held reported output.
    pub removed_hours_with_output: Vec<u32>,
    /// Kept hours whose slot bounds moved. Their output is untouched.
    #[serde(default)]
    pub retimed_hours: Vec<u32>,
}

impl ResizeOutcome {
    /// Returns true if the resize destroyed reported output.
    pub fn lost_output(&self) -> bool {
        !self.removed_hours_with_output.is_empty()
    }
}

impl Worksheet {
    /// Opens a worksheet with one pending record per schedule slot.
    pub fn open(new: NewWorksheet, offset: FixedOffset, now: DateTime<Utc>) -> Self {
        let mut worksheet = Worksheet {
            id: Uuid::new_v4(),
            worker_id: new.worker_id,
            group_id: new.group_id,
            office_id: new.office_id,
            date: new.date,
            product_id: new.product_id,
            process_id: new.process_id,
            shift_type: new.shift_type,
            planned_output_per_hour: new.planned_output_per_hour,
            status: WorksheetStatus::Active,
            created_by_id: new.created_by_id,
            created_at: now,
            updated_at: now,
            version: 0,
            records: Vec::new(),
        };
        let schedule = schedule_for(worksheet.shift_type);
        worksheet.records = schedule
            .slots()
            .iter()
            .map(|slot| WorksheetRecord::seeded(&worksheet, slot, offset, now))
            .collect();
        worksheet
    }

    /// Returns the schedule of the current shift type.
    pub fn schedule(&self) -> ShiftSchedule {
        schedule_for(self.shift_type)
    }

    /// Returns the record for a work hour.
    pub fn record(&self, work_hour: u32) -> Option<&WorksheetRecord> {
        self.records.iter().find(|record| record.work_hour == work_hour)
    }

    /// Returns the record for a work hour, mutably.
    pub fn record_mut(&mut self, work_hour: u32) -> Option<&mut WorksheetRecord> {
        self.records.iter_mut().find(|record| record.work_hour == work_hour)
    }

    /// The default single item seeded into new records.
    pub fn default_item(&self, record_id: Uuid) -> WorksheetRecordItem {
        WorksheetRecordItem {
            id: Uuid::new_v4(),
            record_id,
            entry_index: 1,
            product_id: self.product_id.clone(),
            process_id: self.process_id.clone(),
            planned_output: self.planned_output_per_hour,
            actual_output: 0,
            note: None,
        }
    }

    /// Switches the shift type and brings the records in line with it.
    ///
    /// Shrinking deletes every record above the new last hour, items
    /// included. Growing only adds the missing hours. Kept records only have
    /// their times moved when the new schedule places their slot elsewhere.
    pub fn resize(&mut self, shift_type: ShiftType, offset: FixedOffset, now: DateTime<Utc>) -> ResizeOutcome {
        let schedule = schedule_for(shift_type);
        let mut outcome = ResizeOutcome {
            worksheet_id: self.id,
            ..ResizeOutcome::default()
        };

        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| schedule.contains(record.work_hour));
        for record in &removed {
            outcome.removed_hours.push(record.work_hour);
            if record.has_output() {
                outcome.removed_hours_with_output.push(record.work_hour);
            }
        }
        self.records = kept;
        self.shift_type = shift_type;

        for slot in schedule.slots() {
            let (start_time, end_time) = slot.absolute_range(self.date, offset);
            match self.record_mut(slot.hour) {
                Some(record) => {
                    // Hour 9 spans 16:30-18:00 on an extended shift but 17:00-18:00 on overtime.
                    if (record.start_time, record.end_time) != (start_time, end_time) {
                        record.start_time = start_time;
                        record.end_time = end_time;
                        outcome.retimed_hours.push(slot.hour);
                    }
                }
                None => {
                    let record = WorksheetRecord::seeded(self, slot, offset, now);
                    self.records.push(record);
                    outcome.added_hours.push(slot.hour);
                }
            }
        }
        self.records.sort_by_key(|record| record.work_hour);
        self.updated_at = now;
        outcome
    }

    /// Changes the worksheet defaults, re-seeding untouched pending records.
    ///
    /// A record is re-seeded only while it is pending and still holds the
    /// single default entry built from the previous defaults.
    pub fn update_defaults(
        &mut self,
        product_id: Option<&str>,
        process_id: Option<&str>,
        planned_output_per_hour: Option<u32>,
        now: DateTime<Utc>,
    ) -> bool {
        let old_product = self.product_id.clone();
        let old_process = self.process_id.clone();
        let old_planned = self.planned_output_per_hour;

        if let Some(product_id) = product_id {
            self.product_id = product_id.to_string();
        }
        if let Some(process_id) = process_id {
            self.process_id = process_id.to_string();
        }
        if let Some(planned) = planned_output_per_hour {
            self.planned_output_per_hour = planned;
        }
        let changed = self.product_id != old_product
            || self.process_id != old_process
            || self.planned_output_per_hour != old_planned;
        if !changed {
            return false;
        }

        let seeds: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.has_default_entry_only(&old_product, &old_process, old_planned))
            .map(|(index, _)| index)
            .collect();
        for index in seeds {
            let item = self.default_item(self.records[index].id);
            let record = &mut self.records[index];
            record.items = vec![item];
            record.planned_output = self.planned_output_per_hour;
            record.updated_at = now;
        }
        self.updated_at = now;
        true
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Splits `total` across `weights` proportionally, remainder to the first shares.
fn rebalance(weights: &[u32], total: u32) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }
    let weight_sum: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    let mut shares: Vec<u32> = if weight_sum == 0 {
        vec![total / weights.len() as u32; weights.len()]
    } else {
        weights
            .iter()
            .map(|w| saturate(u64::from(*w) * u64::from(total) / weight_sum))
            .collect()
    };
    let mut remainder = total - shares.iter().sum::<u32>();
    for share in shares.iter_mut() {
        if remainder == 0 {
            break;
        }
        *share += 1;
        remainder -= 1;
    }
    shares
}
