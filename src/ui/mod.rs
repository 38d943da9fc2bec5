/// UI layer: panels (menu, filters), chart views, and the samples table.
pub mod charts;
pub mod panels;
pub mod table;
