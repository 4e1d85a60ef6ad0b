//! 訂單聚合髒狀態追蹤示例

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use trackstate::prelude::*;
use uuid::Uuid;

/// 訂單明細
struct OrderLine {
    status: StatusHandle,
    sku: String,
    quantity: RefCell<Decimal>,
    unit_price: Decimal,
}

const SKU: FieldDescriptor = FieldDescriptor::scalar("sku");
const QUANTITY: FieldDescriptor = FieldDescriptor::scalar("quantity");
const UNIT_PRICE: FieldDescriptor = FieldDescriptor::scalar("unit_price");

impl OrderLine {
    fn new(sku: &str, quantity: i64, unit_price: Decimal) -> Rc<Self> {
        Rc::new(Self {
            status: StatusHandle::new().with_new(),
            sku: sku.to_string(),
            quantity: RefCell::new(Decimal::from(quantity)),
            unit_price,
        })
    }

    fn set_quantity(&self, quantity: Decimal) -> bool {
        let mut slot = self.quantity.borrow_mut();
        self.status.assign(&mut *slot, quantity)
    }

    fn amount(&self) -> Decimal {
        *self.quantity.borrow() * self.unit_price
    }
}

impl PartialEq for OrderLine {
    fn eq(&self, other: &Self) -> bool {
        self.sku == other.sku
    }
}

impl Trackable for OrderLine {
    fn tracking_status(&self) -> Option<&StatusHandle> {
        Some(&self.status)
    }

    fn for_each_field(
        &self,
        visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        visit(&SKU, FieldRef::value(&self.sku))?;
        visit(&UNIT_PRICE, FieldRef::value(&self.unit_price))?;
        let quantity = self.quantity.borrow();
        visit(&QUANTITY, FieldRef::value(&*quantity))
    }
}

/// 訂單（聚合根）
struct Order {
    status: StatusHandle,
    id: Uuid,
    due_date: NaiveDate,
    lines: TrackedList<Rc<OrderLine>>,
    tags: SetField<String>,
    attributes: MapField<String, String>,
}

const ID: FieldDescriptor = FieldDescriptor::scalar("id");
const DUE_DATE: FieldDescriptor = FieldDescriptor::scalar("due_date");
const LINES: FieldDescriptor =
    FieldDescriptor::container("lines", ContainerShape::List).composition();
const TAGS: FieldDescriptor = FieldDescriptor::container("tags", ContainerShape::Set);
const ATTRIBUTES: FieldDescriptor = FieldDescriptor::container("attributes", ContainerShape::Map);

impl Order {
    fn new(lines: Vec<Rc<OrderLine>>) -> Self {
        let status = StatusHandle::new().with_new();
        let lines = TrackedList::new(lines, status.downgrade()).with_node_elements();
        Self {
            status,
            id: Uuid::new_v4(),
            due_date: Utc::now().date_naive(),
            lines,
            tags: SetField::default(),
            attributes: MapField::default(),
        }
    }

    fn set_due_date(&mut self, due_date: NaiveDate) -> bool {
        self.status.assign(&mut self.due_date, due_date)
    }

    fn tags_mut(&mut self) -> trackstate::Result<&mut SetField<String>> {
        self.tags.promote(Some(&self.status), &TAGS)
    }

    fn attributes_mut(&mut self) -> trackstate::Result<&mut MapField<String, String>> {
        self.attributes.promote(Some(&self.status), &ATTRIBUTES)
    }

    fn total(&self) -> Decimal {
        self.lines.iter().map(|line| line.amount()).sum()
    }
}

impl Trackable for Order {
    fn tracking_status(&self) -> Option<&StatusHandle> {
        Some(&self.status)
    }

    fn for_each_field(
        &self,
        visit: &mut dyn FnMut(&FieldDescriptor, FieldRef<'_>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        visit(&ID, FieldRef::value(&self.id))?;
        visit(&DUE_DATE, FieldRef::value(&self.due_date))?;
        visit(&LINES, FieldRef::Collection(self.lines.as_collection()))?;
        visit(&TAGS, self.tags.field_ref())?;
        visit(&ATTRIBUTES, self.attributes.field_ref())
    }
}

fn report(label: &str, order: &Order, evaluator: &GraphDirtyEvaluator) -> Result<()> {
    println!(
        "  [{}] 自身: {}, 組合: {}, 整圖: {}, 新實體: {}",
        label,
        evaluator.is_this_dirty(order),
        evaluator.is_dirty_in(order, DirtyScope::SelfOnly)?,
        evaluator.is_dirty(order)?,
        order.is_new()
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== 訂單聚合髒狀態追蹤示例 ===\n");

    let config = TrackingConfig::from_json(r#"{"compare_before_marking_dirty": true}"#)
        .context("載入追蹤配置失敗")?;
    let toggle = GraphTrackingToggle::new(config.clone());
    let evaluator = GraphDirtyEvaluator::new(config);

    let wheel = OrderLine::new("WHEEL-26", 2, Decimal::new(1250, 2));
    let frame = OrderLine::new("FRAME-AL", 1, Decimal::new(8900, 2));
    let mut order = Order::new(vec![wheel.clone(), frame]);

    let visited = toggle.start_tracking_default(&order, true)?;
    println!("開始追蹤 {} 個節點，訂單 {}", visited, order.id);
    report("載入後", &order, &evaluator)?;

    // 持久化完成：清除 new 與 dirty
    toggle.reset_dirty_status(&order, true)?;
    report("存檔後", &order, &evaluator)?;

    // 相同數量不標記
    wheel.set_quantity(Decimal::from(2));
    report("相同數量", &order, &evaluator)?;

    wheel.set_quantity(Decimal::from(4));
    tracing::info!("明細 {} 數量已更新，訂單總額 {}", wheel.sku, order.total());
    report("修改明細", &order, &evaluator)?;

    let tags = order
        .tags_mut()?
        .as_tracked_mut()
        .context("追蹤中的訂單應已升級 tags")?;
    tags.insert("rush".to_string());
    println!("  新增標籤: {:?}", tags.new_entries());
    report("新增標籤", &order, &evaluator)?;

    toggle.reset_dirty_status(&order, true)?;

    // 新鍵只記錄在變更集，不標記訂單
    let attributes = order
        .attributes_mut()?
        .as_tracked_mut()
        .context("追蹤中的訂單應已升級 attributes")?;
    attributes.put("channel".to_string(), "web".to_string());
    report("新增屬性", &order, &evaluator)?;

    let attributes = order
        .attributes_mut()?
        .as_tracked_mut()
        .context("追蹤中的訂單應已升級 attributes")?;
    attributes.put("channel".to_string(), "store".to_string());
    report("覆寫屬性", &order, &evaluator)?;

    toggle.reset_dirty_status(&order, true)?;
    toggle.stop_tracking_changes_in_state(&order, true)?;

    // 停止追蹤後的修改不會標記
    let next_week = order.due_date + chrono::Duration::days(7);
    order.set_due_date(next_week);
    report("停止追蹤", &order, &evaluator)?;

    println!("\n訂單總額: {}", order.total());

    Ok(())
}
