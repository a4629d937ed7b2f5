//! Example: An algorithmic trading system from `.arch` text
//!
//! Parses a diagram description and prints its DOT source without running
//! Graphviz.

use archviz::DiagramRenderer;

const SOURCE: &str = r##"
diagram "Algorithmic Trading" [direction="TB", curve_style="spline", formats=[svg]];

feed as "Market Data Feed" [shape="parallelogram"];
cluster strategy as "Strategy Engine" {
    signals as "Signal Generation";
    risk as "Risk Checks" [fill_color="#FDF7E3"];
};
cluster execution as "Execution" [bgcolor="#ECE8F6"] {
    oms as "Order Management";
    router as "Smart Order Router";
};
exchange as "Exchange";
ledger as "Positions\nP&L";

feed -> signals: "ticks";
signals -> risk;
risk -> oms: "orders";
oms -> router;
router <-> exchange: "FIX";
exchange -> [style="dashed"] ledger: "fills";
ledger -> [color="gray"] risk;
"##;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let renderer = DiagramRenderer::default();
    let diagram = renderer.parse(SOURCE)?;
    println!("{}", renderer.to_dot(&diagram)?);
    Ok(())
}
