use crate::common::models::{BalanceSign, Block, ForecastRow, SLOTS_PER_DAY, SLOT_MINUTES};

/// Collapses the 288-row matrix into a sequence of price/sign-homogeneous
/// blocks. Row `i+1` joins the block open at `i` iff both tariffs are
/// unchanged and the sign of net balance (`load_kw - pv_kw`) is unchanged;
/// a net balance of exactly zero is its own sign class.
///
/// Every slot belongs to exactly one block, and the boundaries include
/// every price-change and sign-flip instant by construction -- this
/// function never merges across one.
pub fn compress(matrix: &[ForecastRow; SLOTS_PER_DAY]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut start_slot = 0;

    while start_slot < SLOTS_PER_DAY {
        let mut end_slot_exclusive = start_slot + 1;
        while end_slot_exclusive < SLOTS_PER_DAY
            && same_block(&matrix[end_slot_exclusive - 1], &matrix[end_slot_exclusive])
        {
            end_slot_exclusive += 1;
        }

        let slot_count = end_slot_exclusive - start_slot;
        let duration_h = slot_count as f64 * SLOT_MINUTES as f64 / 60.0;
        let balance_kwh: f64 = matrix[start_slot..end_slot_exclusive]
            .iter()
            .map(|row| (row.load_kw - row.pv_kw) * SLOT_MINUTES as f64 / 60.0)
            .sum();

        blocks.push(Block {
            block_index: blocks.len(),
            start_slot,
            end_slot_exclusive,
            duration_h,
            import_rate_c: matrix[start_slot].import_rate_c,
            export_rate_c: matrix[start_slot].export_rate_c,
            balance_kwh,
            balance_sign: BalanceSign::of(balance_kwh),
        });

        start_slot = end_slot_exclusive;
    }

    blocks
}

fn same_block(a: &ForecastRow, b: &ForecastRow) -> bool {
    a.import_rate_c == b.import_rate_c
        && a.export_rate_c == b.export_rate_c
        && net_sign(a) == net_sign(b)
}

fn net_sign(row: &ForecastRow) -> BalanceSign {
    BalanceSign::of(row.load_kw - row.pv_kw)
}
