pub mod formatter;

pub use formatter::{
    format_board_list, format_board_table, format_board_tsv, format_duration, format_golf_table,
    format_golf_tsv, format_points, format_relative_age, format_score, rank_badge, resolve_locale,
    should_use_colors, truncate_text,
};
