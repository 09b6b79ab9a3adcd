pub fn csv_fixture() -> &'static str {
    return r#"
item,qty,unit cost
bolt,500,0.12
nut,800,0.08
washer,1200,0.05
"#
    .trim_start();
}

pub fn answer_fixture() -> &'static str {
    return r#"
The economic order quantity is given by:



\[
Q^* = \sqrt{\frac{2DS}{H}}
\]

where \(D\) is the annual demand, $S$ the ordering cost and $H$ the holding cost.
"#
    .trim();
}

/// Three pages: "Chapter 1 Demand forecasting", a page without text, then
/// "Chapter 2 Inventory policy".
pub fn pdf_fixture() -> &'static [u8] {
    return include_bytes!("../fixtures/course.pdf");
}

/// Two worksheets. "Stock" (item, qty) comes first, then "Suppliers"
/// (supplier, lead time).
pub fn xlsx_fixture() -> &'static [u8] {
    return include_bytes!("../fixtures/stock.xlsx");
}
