pub mod stage1_load;
pub mod stage2_columns;
pub mod stage3_heatmap;
pub mod stage4_table;
pub mod stage5_export;
